//! Workbench Domain - Core types for the SPARQL query workbench
//!
//! This crate defines the domain model: layered request configuration,
//! authentication schemes, endpoint registry entries, tab and session
//! state, normalized query responses, and CONSTRUCT result validation.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod id;
pub mod query;
pub mod request;
pub mod response;
pub mod session;
pub mod settings;
pub mod tab;
pub mod validation;
pub mod value;

pub use auth::{
    ApiKeyAuth, AuthError, AuthLayer, AuthScheme, AuthSchemes, BasicAuth, BearerAuth, OAuth2Auth,
    RefreshedToken,
};
pub use endpoint::{AuthUpdate, EndpointConfig, EndpointUpdate};
pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use query::{QueryContext, QueryMode, QueryType, StaticQuery};
pub use request::{
    ConcreteRequestConfig, CredentialsMode, HttpMethod, PlainRequestConfig, PreparedRequest,
    RequestArg, RequestConfigLayer,
};
pub use response::{
    ErrorSummary, NormalizedResponse, ResponseSummary, StatusGuidance, SuccessResponse,
};
pub use session::{ClosedTab, SessionState, parse_prefix_line, prefixes_in};
pub use settings::{Orientation, ThemeMode, WorkbenchSettings};
pub use tab::TabState;
pub use validation::{Triple, ValidationPattern, ValidationResult, matches_pattern, validate};
pub use value::{ConfigValue, DynamicValueError, QueryAdjuster};
