//! Attaches authentication headers to a request.
//!
//! `OAuth2` and Bearer tokens and Basic credentials all compete for the
//! `Authorization` header, in that priority order. An API key goes into its own
//! header. Existing headers are never overwritten; a collision is logged and
//! the scheme is skipped.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;
use workbench_domain::AuthSchemes;

/// Name of the header shared by token and Basic schemes.
pub const AUTHORIZATION: &str = "Authorization";

/// Adds authentication headers for the offered schemes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationAttacher;

impl AuthenticationAttacher {
    /// Returns a copy of `headers` with authentication added.
    ///
    /// Blank credentials count as not configured and are skipped silently.
    #[must_use]
    pub fn attach(
        headers: &BTreeMap<String, String>,
        schemes: &AuthSchemes,
    ) -> BTreeMap<String, String> {
        let mut headers = headers.clone();

        let oauth2_token = schemes
            .oauth2
            .as_ref()
            .map(|oauth2| oauth2.access_token.trim())
            .filter(|token| !token.is_empty());
        let bearer_token = schemes
            .bearer
            .as_ref()
            .map(|bearer| bearer.token.trim())
            .filter(|token| !token.is_empty());

        let token = oauth2_token
            .map(|token| ("oauth2", token))
            .or_else(|| bearer_token.map(|token| ("bearer", token)));
        if let Some((scheme, token)) = token {
            insert_unless_present(&mut headers, AUTHORIZATION, format!("Bearer {token}"), scheme);
        }

        if let Some(api_key) = &schemes.api_key {
            let name = api_key.header_name.trim();
            let key = api_key.api_key.trim();
            if !name.is_empty() && !key.is_empty() {
                insert_unless_present(&mut headers, name, key.to_string(), "apiKey");
            }
        }

        if token.is_none()
            && let Some(basic) = &schemes.basic
            && !basic.username.trim().is_empty()
            && !basic.password.trim().is_empty()
        {
            let credentials = STANDARD.encode(format!("{}:{}", basic.username, basic.password));
            insert_unless_present(
                &mut headers,
                AUTHORIZATION,
                format!("Basic {credentials}"),
                "basic",
            );
        }

        headers
    }
}

fn insert_unless_present(
    headers: &mut BTreeMap<String, String>,
    name: &str,
    value: String,
    scheme: &'static str,
) {
    if headers.keys().any(|existing| existing.eq_ignore_ascii_case(name)) {
        warn!(scheme, header = name, "Header already set, skipping authentication scheme");
        return;
    }
    headers.insert(name.to_string(), value);
}
