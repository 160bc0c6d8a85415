//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP method is not supported by SPARQL endpoints.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The query type keyword is not recognized.
    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    /// No tab with this identifier exists in the session.
    #[error("unknown tab: {0}")]
    UnknownTab(String),

    /// A requested tab order is not a permutation of the open tabs.
    #[error("invalid tab order: {0}")]
    InvalidTabOrder(String),

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
