//! Status-specific guidance for failed requests.

use serde::Serialize;

/// A title and suggestions explaining a failure to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusGuidance {
    /// Short heading
    pub title: &'static str,
    /// Things the user can check or try
    pub suggestions: &'static [&'static str],
}

const fn guidance(title: &'static str, suggestions: &'static [&'static str]) -> StatusGuidance {
    StatusGuidance { title, suggestions }
}

const GATEWAY_SUGGESTIONS: &[&str] = &[
    "The endpoint is temporarily unavailable or overloaded",
    "Try again in a few moments",
    "The service may be undergoing maintenance",
];

/// Returns guidance for a failure with the given status.
///
/// `None` means no HTTP response was received, which usually points at a
/// wrong URL, an unreachable endpoint, or a missing CORS configuration.
#[must_use]
pub const fn guidance_for(status: Option<u16>) -> Option<StatusGuidance> {
    let Some(status) = status else {
        return Some(guidance(
            "Unable to get response from endpoint",
            &[
                "Incorrect endpoint URL",
                "Endpoint is down",
                "Endpoint is not accessible from this host and is not CORS-enabled",
            ],
        ));
    };

    let found = match status {
        401 => guidance(
            "Authentication Required",
            &[
                "The endpoint requires authentication credentials",
                "Check if you need to provide an API key, username/password, or bearer token",
                "Verify your credentials are correct and not expired",
            ],
        ),
        403 => guidance(
            "Access Forbidden",
            &[
                "You don't have permission to access this endpoint",
                "Your credentials may be valid but lack sufficient privileges",
                "Contact the endpoint administrator to request access",
            ],
        ),
        404 => guidance(
            "Endpoint Not Found",
            &[
                "The endpoint URL may be incorrect or has changed",
                "Check for typos in the endpoint address",
                "Verify the endpoint is still active and hasn't been moved",
            ],
        ),
        429 => guidance(
            "Too Many Requests",
            &[
                "You've exceeded the rate limit for this endpoint",
                "Wait a few moments before trying again",
                "Consider reducing query frequency or contacting the endpoint provider for higher limits",
            ],
        ),
        500 => guidance(
            "Internal Server Error",
            &[
                "The SPARQL endpoint encountered an error while processing your query",
                "Try simplifying your query or reducing the result limit",
                "Check the error message below for specific details",
                "If the problem persists, contact the endpoint administrator",
            ],
        ),
        502 => guidance("Bad Gateway", GATEWAY_SUGGESTIONS),
        503 => guidance("Service Unavailable", GATEWAY_SUGGESTIONS),
        504 => guidance("Gateway Timeout", GATEWAY_SUGGESTIONS),
        400..=499 => guidance(
            "Client Error",
            &[
                "There's an issue with the request",
                "Check the error message below for details",
            ],
        ),
        500..=599 => guidance(
            "Server Error",
            &[
                "The endpoint failed to process the request",
                "Check the error message below for details",
            ],
        ),
        _ => return None,
    };
    Some(found)
}

/// Returns the canonical reason phrase for common status codes.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_specific_statuses() {
        assert_eq!(guidance_for(Some(401)).unwrap().title, "Authentication Required");
        assert_eq!(guidance_for(Some(403)).unwrap().title, "Access Forbidden");
        assert_eq!(guidance_for(Some(404)).unwrap().title, "Endpoint Not Found");
        assert_eq!(guidance_for(Some(429)).unwrap().title, "Too Many Requests");
        assert_eq!(guidance_for(Some(500)).unwrap().suggestions.len(), 4);
    }

    #[test]
    fn test_gateway_statuses_are_distinguished() {
        assert_eq!(guidance_for(Some(502)).unwrap().title, "Bad Gateway");
        assert_eq!(guidance_for(Some(503)).unwrap().title, "Service Unavailable");
        assert_eq!(guidance_for(Some(504)).unwrap().title, "Gateway Timeout");
    }

    #[test]
    fn test_generic_ranges() {
        assert_eq!(guidance_for(Some(418)).unwrap().title, "Client Error");
        assert_eq!(guidance_for(Some(507)).unwrap().title, "Server Error");
        assert!(guidance_for(Some(302)).is_none());
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(200), "OK");
        assert_eq!(reason_phrase(599), "Unknown");
    }
}
