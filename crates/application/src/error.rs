//! Application error types

use thiserror::Error;
use workbench_domain::DomainError;

use crate::ports::StorageError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The requested tab is not open.
    #[error("tab not found: {0}")]
    TabNotFound(String),

    /// The tab was closed and no longer accepts commands.
    #[error("tab closed: {0}")]
    TabClosed(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
