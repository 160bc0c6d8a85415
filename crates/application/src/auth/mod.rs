//! Authentication for outgoing SPARQL requests.
//!
//! This module provides:
//! - Header attachment for the configured auth schemes
//! - `OAuth2` token refresh for endpoint registry entries

mod attacher;
mod refresh;

pub use attacher::{AUTHORIZATION, AuthenticationAttacher};
pub use refresh::refresh_endpoint_token;
