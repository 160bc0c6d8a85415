//! `OAuth2` token refresh port

use workbench_domain::{AuthError, RefreshedToken};

use super::BoxFuture;

/// Port for exchanging a refresh token for a new access token.
pub trait TokenRefresher: Send + Sync {
    /// Performs a `refresh_token` grant against the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or rejects the grant.
    fn refresh<'a>(
        &'a self,
        token_endpoint: &'a str,
        client_id: &'a str,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, Result<RefreshedToken, AuthError>>;
}
