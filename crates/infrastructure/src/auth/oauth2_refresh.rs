//! `OAuth2` refresh grant against a token endpoint.

use serde::Deserialize;
use tracing::debug;
use workbench_application::ports::{BoxFuture, TokenRefresher};
use workbench_domain::{AuthError, RefreshedToken};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token endpoint error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Performs `refresh_token` grants for public clients.
pub struct OAuth2RefreshClient {
    http_client: reqwest::Client,
}

impl OAuth2RefreshClient {
    /// Creates a client that does not follow redirects.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn refresh_token_flow(
        &self,
        token_endpoint: &str,
        client_id: &str,
        refresh_token: &str,
    ) -> Result<RefreshedToken, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("refresh_token", refresh_token),
        ];
        let body = serde_urlencoded::to_string(params).map_err(|e| AuthError::NetworkError {
            message: format!("Failed to encode form: {e}"),
        })?;

        debug!(token_endpoint, client_id, "Refreshing OAuth2 token");
        let response = self
            .http_client
            .post(token_endpoint)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::NetworkError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TokenErrorResponse>(&error_text).map_or_else(
                |_| format!("{status}: {error_text}"),
                |error| error.error_description.unwrap_or(error.error),
            );
            return Err(AuthError::RefreshFailed { message });
        }

        let token: TokenResponse = response.json().await.map_err(|e| AuthError::NetworkError {
            message: format!("Failed to parse token response: {e}"),
        })?;

        Ok(RefreshedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in_secs: token.expires_in,
        })
    }
}

impl Default for OAuth2RefreshClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenRefresher for OAuth2RefreshClient {
    fn refresh<'a>(
        &'a self,
        token_endpoint: &'a str,
        client_id: &'a str,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, Result<RefreshedToken, AuthError>> {
        Box::pin(self.refresh_token_flow(token_endpoint, client_id, refresh_token))
    }
}
