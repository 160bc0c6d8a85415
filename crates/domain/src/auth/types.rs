//! Authentication scheme types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::query::QueryContext;
use crate::value::{ConfigValue, DynamicValueError};

/// Seconds before expiry at which an `OAuth2` token is treated as expired.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// HTTP Basic credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

/// A static bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerAuth {
    /// The token, without the `Bearer ` prefix
    pub token: String,
}

/// An API key sent in a custom header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyAuth {
    /// Header carrying the key
    pub header_name: String,
    /// The key
    pub api_key: String,
}

/// An `OAuth2` access token with optional refresh metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Auth {
    /// The access token
    pub access_token: String,
    /// Refresh token, if the provider issued one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When the access token expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Client id used for refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Token endpoint used for refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
}

impl OAuth2Auth {
    /// Creates a token without refresh metadata.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expiry: None,
            client_id: None,
            token_endpoint: None,
        }
    }

    /// Check if the token is expired or will expire within the buffer.
    ///
    /// A token without a known expiry never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| {
            now + Duration::seconds(TOKEN_EXPIRY_BUFFER_SECS) >= expiry
        })
    }

    /// Returns true if a refresh can be attempted.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        present(&self.refresh_token) && present(&self.client_id) && present(&self.token_endpoint)
    }

    /// Applies a refreshed token obtained at `now`.
    ///
    /// The refresh token is kept when the provider does not rotate it.
    pub fn apply_refresh(&mut self, refreshed: RefreshedToken, now: DateTime<Utc>) {
        self.access_token = refreshed.access_token;
        if let Some(refresh_token) = refreshed.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expiry = refreshed
            .expires_in_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
    }
}

/// Token material returned by a refresh grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    /// New access token
    pub access_token: String,
    /// Rotated refresh token, if any
    pub refresh_token: Option<String>,
    /// Lifetime of the new access token
    pub expires_in_secs: Option<u64>,
}

/// The authentication configured for one endpoint. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthScheme {
    /// HTTP Basic
    Basic(BasicAuth),
    /// Static bearer token
    Bearer(BearerAuth),
    /// API key header
    ApiKey(ApiKeyAuth),
    /// `OAuth2` access token
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2Auth),
}

impl AuthScheme {
    /// Creates Basic credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic(BasicAuth {
            username: username.into(),
            password: password.into(),
        })
    }

    /// Creates a bearer token.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(BearerAuth {
            token: token.into(),
        })
    }

    /// Creates an API key header.
    #[must_use]
    pub fn api_key(header_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::ApiKey(ApiKeyAuth {
            header_name: header_name.into(),
            api_key: api_key.into(),
        })
    }

    /// Returns a short name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Basic(_) => "basic",
            Self::Bearer(_) => "bearer",
            Self::ApiKey(_) => "apiKey",
            Self::OAuth2(_) => "oauth2",
        }
    }
}

/// Resolved authentication offered to a single request.
///
/// Several schemes may be present at once when layers disagree; the
/// attacher decides which of them actually write headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSchemes {
    /// `OAuth2` token
    pub oauth2: Option<OAuth2Auth>,
    /// Bearer token
    pub bearer: Option<BearerAuth>,
    /// API key
    pub api_key: Option<ApiKeyAuth>,
    /// Basic credentials
    pub basic: Option<BasicAuth>,
}

impl AuthSchemes {
    /// Returns true if no scheme is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.oauth2.is_none() && self.bearer.is_none() && self.api_key.is_none() && self.basic.is_none()
    }
}

impl From<AuthScheme> for AuthSchemes {
    fn from(scheme: AuthScheme) -> Self {
        let mut schemes = Self::default();
        match scheme {
            AuthScheme::Basic(basic) => schemes.basic = Some(basic),
            AuthScheme::Bearer(bearer) => schemes.bearer = Some(bearer),
            AuthScheme::ApiKey(api_key) => schemes.api_key = Some(api_key),
            AuthScheme::OAuth2(oauth2) => schemes.oauth2 = Some(oauth2),
        }
        schemes
    }
}

/// Authentication contributed by one configuration layer.
#[derive(Debug, Clone, Default)]
pub struct AuthLayer {
    /// `OAuth2` token
    pub oauth2: Option<ConfigValue<OAuth2Auth>>,
    /// Bearer token
    pub bearer: Option<ConfigValue<BearerAuth>>,
    /// API key
    pub api_key: Option<ConfigValue<ApiKeyAuth>>,
    /// Basic credentials
    pub basic: Option<ConfigValue<BasicAuth>>,
}

impl AuthLayer {
    /// Returns true if the layer offers no authentication.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.oauth2.is_none() && self.bearer.is_none() && self.api_key.is_none() && self.basic.is_none()
    }

    /// Combines two layers; schemes set on `later` replace those on `self`.
    #[must_use]
    pub fn overlay(self, later: Self) -> Self {
        Self {
            oauth2: later.oauth2.or(self.oauth2),
            bearer: later.bearer.or(self.bearer),
            api_key: later.api_key.or(self.api_key),
            basic: later.basic.or(self.basic),
        }
    }

    /// Evaluates every scheme against the context.
    ///
    /// # Errors
    ///
    /// Returns the first failure of a dynamic scheme.
    pub fn resolve(&self, ctx: &dyn QueryContext) -> Result<AuthSchemes, DynamicValueError> {
        Ok(AuthSchemes {
            oauth2: self.oauth2.as_ref().map(|v| v.resolve(ctx)).transpose()?,
            bearer: self.bearer.as_ref().map(|v| v.resolve(ctx)).transpose()?,
            api_key: self.api_key.as_ref().map(|v| v.resolve(ctx)).transpose()?,
            basic: self.basic.as_ref().map(|v| v.resolve(ctx)).transpose()?,
        })
    }
}

impl From<AuthScheme> for AuthLayer {
    fn from(scheme: AuthScheme) -> Self {
        let mut layer = Self::default();
        match scheme {
            AuthScheme::Basic(basic) => layer.basic = Some(ConfigValue::Static(basic)),
            AuthScheme::Bearer(bearer) => layer.bearer = Some(ConfigValue::Static(bearer)),
            AuthScheme::ApiKey(api_key) => layer.api_key = Some(ConfigValue::Static(api_key)),
            AuthScheme::OAuth2(oauth2) => layer.oauth2 = Some(ConfigValue::Static(oauth2)),
        }
        layer
    }
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token cannot be refreshed with the stored metadata.
    MissingRefreshConfiguration,
    /// The token endpoint rejected the refresh.
    RefreshFailed {
        /// Error description.
        message: String,
    },
    /// The token endpoint could not be reached.
    NetworkError {
        /// Error description.
        message: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRefreshConfiguration => {
                write!(f, "Token refresh needs a refresh token, client id and token endpoint")
            }
            Self::RefreshFailed { message } => write!(f, "Failed to refresh token: {message}"),
            Self::NetworkError { message } => write!(f, "Network error: {message}"),
        }
    }
}

impl std::error::Error for AuthError {}
