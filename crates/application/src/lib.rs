//! Workbench Application - Query execution and session orchestration
//!
//! This crate defines the application layer with:
//! - Port traits (transport, storage, clock, token refresh, editor surfaces)
//! - Layered request configuration resolution and authentication headers
//! - The query executor and the per-tab session state machine
//! - Persistence with expiry and the multi-tab workbench
//! - Application-level error handling and workbench events

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod events;
pub mod executor;
pub mod ports;
pub mod store;
pub mod tab_session;
pub mod workbench;

#[cfg(test)]
mod test_support;

pub use auth::{AUTHORIZATION, AuthenticationAttacher, refresh_endpoint_token};
pub use config::{RequestConfigResolver, WorkbenchConfig};
pub use cors::{CorsCache, PROBE_QUERY};
pub use error::{ApplicationError, ApplicationResult};
pub use events::{EventBus, WorkbenchEvent};
pub use executor::{
    Completion, ExecutionError, ExecutionObserver, NoopObserver, QueryError, QueryExecutor,
};
pub use ports::{
    CancellationReceiver, CancellationToken, Clock, KeyValueStorage, QueryEditor,
    ResultsRenderer, SparqlTransport, StorageError, TabSurface, TabSurfaceFactory, TokenRefresher,
    TransportError, TransportResponse,
};
pub use store::{PersistentStore, SessionStore};
pub use tab_session::{QueryOutcome, TabServices, TabSession};
pub use workbench::Workbench;
