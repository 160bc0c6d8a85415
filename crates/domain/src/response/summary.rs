//! Size-bounded response snapshot persisted with a tab.

use serde::{Deserialize, Serialize};

use super::NormalizedResponse;

/// The last response of a tab, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    /// The response
    pub response: NormalizedResponse,
    /// Time from send to completion
    pub duration_ms: u64,
}

impl ResponseSummary {
    /// Captures a response for persistence.
    ///
    /// Returns `None` when the response exceeds `max_bytes`; the caller still
    /// renders it live but keeps no stored copy.
    #[must_use]
    pub fn capture(
        response: &NormalizedResponse,
        duration_ms: u64,
        max_bytes: Option<usize>,
    ) -> Option<Self> {
        if max_bytes.is_some_and(|max| response.size_bytes() > max) {
            return None;
        }
        Some(Self {
            response: response.clone(),
            duration_ms,
        })
    }
}
