//! Workbench Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings files and
//! Turtle export/import of sessions and N-Triples reading.

pub mod adapters;
pub mod auth;
pub mod persistence;
pub mod serialization;
pub mod turtle;

pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::OAuth2RefreshClient;
pub use persistence::{
    APP_DIR, FileKeyValueStorage, MemoryKeyValueStorage, SettingsError, SettingsRepository,
};
pub use serialization::{
    SerializationError, from_json, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
pub use turtle::{TurtleError, parse_ntriples, parse_session, serialize_session};
