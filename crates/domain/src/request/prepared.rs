//! A request ready to be handed to the transport.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::HttpMethod;

/// Content type of a SPARQL protocol POST body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Whether cookies and credentials accompany the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialsMode {
    /// Only for same-origin requests
    #[default]
    SameOrigin,
    /// Always, including cross-origin requests
    Include,
}

impl CredentialsMode {
    /// Maps the `withCredentials` flag to a mode.
    #[must_use]
    pub const fn from_flag(with_credentials: bool) -> Self {
        if with_credentials {
            Self::Include
        } else {
            Self::SameOrigin
        }
    }
}

/// Method, URL, headers and body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Full URL, including the query string for GET
    pub url: String,
    /// Final headers, including authentication
    pub headers: BTreeMap<String, String>,
    /// Form-urlencoded body for POST
    pub body: Option<String>,
    /// Credentials mode
    pub credentials: CredentialsMode,
}

impl PreparedRequest {
    /// Looks up a header value, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Renders the request as a curl command line.
    #[must_use]
    pub fn to_curl(&self) -> String {
        let mut out = format!("curl {}", shell_quote(&self.url));
        if let Some(body) = &self.body {
            let _ = write!(out, " --data {}", shell_quote(body));
        }
        let _ = write!(out, " -X {}", self.method);
        for (name, value) in &self.headers {
            let _ = write!(out, " -H {}", shell_quote(&format!("{name}: {value}")));
        }
        out
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
