//! Endpoint registry entries.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthLayer, AuthScheme};
use crate::request::RequestConfigLayer;

/// Settings attached to one endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Endpoint URL, unique within a session
    pub endpoint: String,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Whether to offer the endpoint as a quick-select button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_as_button: Option<bool>,
    /// Authentication used for requests to this endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthScheme>,
}

impl EndpointConfig {
    /// Creates an entry with no settings.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            label: None,
            show_as_button: None,
            authentication: None,
        }
    }

    /// Merges an update into this entry.
    pub fn apply(&mut self, update: EndpointUpdate) {
        if let Some(label) = update.label {
            self.label = Some(label);
        }
        if let Some(show_as_button) = update.show_as_button {
            self.show_as_button = Some(show_as_button);
        }
        match update.authentication {
            AuthUpdate::Keep => {}
            AuthUpdate::Set(scheme) => self.authentication = Some(scheme),
            AuthUpdate::Remove => self.authentication = None,
        }
    }

    /// Returns true if shown as a button.
    #[must_use]
    pub fn is_button(&self) -> bool {
        self.show_as_button.unwrap_or(false)
    }

    /// The configuration layer this endpoint contributes to its requests.
    #[must_use]
    pub fn to_layer(&self) -> RequestConfigLayer {
        let auth = self
            .authentication
            .clone()
            .map(AuthLayer::from)
            .unwrap_or_default();
        RequestConfigLayer::new().with_auth(auth)
    }
}

/// What to do with an endpoint's authentication on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthUpdate {
    /// Leave it unchanged
    #[default]
    Keep,
    /// Replace it
    Set(AuthScheme),
    /// Remove it
    Remove,
}

/// A partial update of an endpoint entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointUpdate {
    /// New label
    pub label: Option<String>,
    /// New button flag
    pub show_as_button: Option<bool>,
    /// Authentication change
    pub authentication: AuthUpdate,
}

impl EndpointUpdate {
    /// An update that only sets authentication.
    #[must_use]
    pub fn authentication(scheme: AuthScheme) -> Self {
        Self {
            authentication: AuthUpdate::Set(scheme),
            ..Self::default()
        }
    }
}
