//! Command line error types

use std::path::PathBuf;

use thiserror::Error;
use workbench_application::{ApplicationError, TransportError};
use workbench_infrastructure::{SerializationError, SettingsError, TurtleError};

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum AppError {
    /// A workbench operation failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The settings file could not be read or written.
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    /// The HTTP client could not be built.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// A Turtle session file could not be parsed.
    #[error("turtle: {0}")]
    Turtle(#[from] TurtleError),

    /// A JSON session file could not be read or written.
    #[error("json: {0}")]
    Serialization(#[from] SerializationError),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file given on the command line could not be read.
    #[error("cannot read {path}: {source}")]
    ReadFile {
        /// The file
        path: PathBuf,
        /// Cause
        source: std::io::Error,
    },

    /// The session has no tab to run the command on.
    #[error("no active tab")]
    NoActiveTab,

    /// A command line value is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
