//! Authentication domain types

mod types;

pub use types::{
    ApiKeyAuth, AuthError, AuthLayer, AuthScheme, AuthSchemes, BasicAuth, BearerAuth, OAuth2Auth,
    RefreshedToken, TOKEN_EXPIRY_BUFFER_SECS,
};
