//! Workbench - command line front end
//!
//! Runs SPARQL queries in persistent tabs from the terminal. Tabs, endpoint
//! history and the endpoint registry survive between invocations in the
//! user data directory.

pub mod cli;
pub mod commands;
pub mod console;
pub mod context;
pub mod error;

pub use cli::Args;
pub use commands::run;
pub use error::AppError;
