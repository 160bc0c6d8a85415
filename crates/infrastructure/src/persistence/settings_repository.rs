//! Workbench settings persistence.
//!
//! Settings live in the platform-specific config directory:
//! - Linux: ~/.config/sparql-workbench/settings.json
//! - macOS: ~/Library/Application Support/sparql-workbench/settings.json
//! - Windows: %APPDATA%/sparql-workbench/settings.json

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use workbench_domain::WorkbenchSettings;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Directory name under the platform config and data directories.
pub const APP_DIR: &str = "sparql-workbench";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Could not determine config directory.
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Repository for workbench settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
}

impl SettingsRepository {
    /// Uses the platform config directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            path: dirs::config_dir().map(|p| p.join(APP_DIR).join("settings.json")),
        }
    }

    /// Uses an explicit settings file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The settings file, if a config directory is known.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads settings from disk.
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(&self) -> Result<WorkbenchSettings, SettingsError> {
        let Some(path) = &self.path else {
            return Ok(WorkbenchSettings::default());
        };

        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(WorkbenchSettings::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(from_json_bytes(&content)?)
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if no config directory is known or the write fails.
    pub async fn save(&self, settings: &WorkbenchSettings) -> Result<(), SettingsError> {
        let path = self.path.as_ref().ok_or(SettingsError::NoConfigDir)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, to_json_stable_bytes(settings)?).await?;
        Ok(())
    }
}

impl Default for SettingsRepository {
    fn default() -> Self {
        Self::new()
    }
}
