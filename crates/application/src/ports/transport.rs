//! SPARQL transport port and request cancellation.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use workbench_domain::PreparedRequest;

use super::BoxFuture;

/// A raw HTTP response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// HTTP reason phrase
    pub status_text: String,
    /// Response headers with lower-cased names
    pub headers: BTreeMap<String, String>,
    /// Response body decoded as text
    pub body: String,
}

impl TransportResponse {
    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failures where no HTTP response was obtained.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The URL could not be used.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending prepared SPARQL requests.
pub trait SparqlTransport: Send + Sync {
    /// Sends the request and returns the response, including non-2xx ones.
    ///
    /// # Errors
    ///
    /// Returns an error only when no HTTP response was received.
    fn send<'a>(
        &'a self,
        request: &'a PreparedRequest,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}

/// Cancels an in-flight request.
///
/// Cloning shares the same signal.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Returns a receiver observing this token.
    #[must_use]
    pub fn receiver(&self) -> CancellationReceiver {
        CancellationReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Observes a `CancellationToken`.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Resolves once the token is cancelled. Never resolves otherwise.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Returns true once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_receiver() {
        let token = CancellationToken::new();
        let mut receiver = token.receiver();
        assert!(!receiver.is_cancelled());

        let waiter = tokio::spawn(async move {
            receiver.cancelled().await;
            true
        });
        token.cancel();
        let woke = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(matches!(woke, Ok(Ok(true))));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_receiver_created_after_cancel_resolves() {
        let token = CancellationToken::new();
        token.cancel();
        let mut receiver = token.receiver();
        let done = tokio::time::timeout(Duration::from_millis(100), receiver.cancelled()).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn test_uncancelled_receiver_stays_pending() {
        let token = CancellationToken::new();
        let mut receiver = token.receiver();
        let done = tokio::time::timeout(Duration::from_millis(20), receiver.cancelled()).await;
        assert!(done.is_err());
    }

    #[test]
    fn test_status_classification() {
        let mut response = TransportResponse {
            status: 204,
            status_text: "No Content".to_string(),
            headers: BTreeMap::new(),
            body: String::new(),
        };
        assert!(response.is_success());
        response.status = 404;
        assert!(!response.is_success());
    }
}
