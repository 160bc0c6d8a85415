//! The uniform response shape handed to results renderers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::status::{StatusGuidance, guidance_for};

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    /// Always true
    pub ok: bool,
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub status_text: String,
    /// Response headers, lower-cased names
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body
    pub content: String,
}

impl SuccessResponse {
    /// Returns the response content type, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// What is known about a failed request.
///
/// `status` is absent when no HTTP response was received at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    /// HTTP status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// HTTP reason phrase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Response body or error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ErrorSummary {
    /// Creates a summary for an HTTP error response.
    #[must_use]
    pub fn http(status: u16, status_text: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            status_text: Some(status_text.into()),
            text: Some(text.into()),
        }
    }

    /// Creates a summary for a failure without any HTTP response.
    #[must_use]
    pub fn network(text: impl Into<String>) -> Self {
        Self {
            status: None,
            status_text: None,
            text: Some(text.into()),
        }
    }

    /// Returns user-facing guidance for this failure.
    #[must_use]
    pub fn guidance(&self) -> Option<StatusGuidance> {
        guidance_for(self.status)
    }
}

/// A response as seen by the results renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedResponse {
    /// The endpoint answered with a 2xx status.
    Success(SuccessResponse),
    /// The request failed.
    Failure {
        /// Failure details
        error: ErrorSummary,
    },
}

impl NormalizedResponse {
    /// Wraps an error summary.
    #[must_use]
    pub const fn failure(error: ErrorSummary) -> Self {
        Self::Failure { error }
    }

    /// Returns true for a successful response.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error summary of a failed response.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorSummary> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Returns the body of a successful response.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Success(success) => Some(&success.content),
            Self::Failure { .. } => None,
        }
    }

    /// Approximate stored size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Success(success) => success.content.len(),
            Self::Failure { error } => error.text.as_ref().map_or(0, String::len),
        }
    }
}
