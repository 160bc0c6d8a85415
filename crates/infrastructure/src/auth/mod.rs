//! `OAuth2` token endpoint client.

mod oauth2_refresh;

pub use oauth2_refresh::OAuth2RefreshClient;
