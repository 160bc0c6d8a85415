//! Wires settings, storage and adapters into a workbench.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use workbench_application::{
    CorsCache, EventBus, KeyValueStorage, PersistentStore, TabServices, Workbench, WorkbenchConfig,
};
use workbench_domain::WorkbenchSettings;
use workbench_infrastructure::{
    APP_DIR, FileKeyValueStorage, MemoryKeyValueStorage, OAuth2RefreshClient, ReqwestTransport,
    SettingsRepository, SystemClock,
};

use crate::cli::GlobalOptions;
use crate::console::ConsoleSurfaces;
use crate::error::AppError;

/// The settings repository selected by the options.
#[must_use]
pub fn settings_repository(global: &GlobalOptions) -> SettingsRepository {
    global
        .settings
        .clone()
        .map_or_else(SettingsRepository::new, SettingsRepository::with_path)
}

/// Loads settings and applies command line and environment overrides.
///
/// # Errors
///
/// Returns an error if the settings file exists but cannot be read.
pub async fn load_settings(
    repository: &SettingsRepository,
    global: &GlobalOptions,
) -> Result<WorkbenchSettings, AppError> {
    let mut settings = repository.load().await?;
    if let Some(endpoint) = &global.default_endpoint {
        settings.default_endpoint.clone_from(endpoint);
    }
    if let Some(proxy) = &global.cors_proxy {
        settings.cors_proxy = Some(proxy.clone());
    }
    Ok(settings)
}

/// Directory holding the persisted session, if any.
#[must_use]
pub fn data_dir(global: &GlobalOptions) -> Option<PathBuf> {
    global
        .data_dir
        .clone()
        .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR)))
}

fn open_storage(global: &GlobalOptions) -> Arc<dyn KeyValueStorage> {
    if global.ephemeral {
        return Arc::new(MemoryKeyValueStorage::new());
    }
    match data_dir(global) {
        Some(dir) => {
            debug!(path = %dir.display(), "Using session directory");
            Arc::new(FileKeyValueStorage::new(dir))
        }
        None => {
            warn!("No data directory available, the session will not be saved");
            Arc::new(MemoryKeyValueStorage::new())
        }
    }
}

/// An open workbench and the console surfaces of its tabs.
pub struct AppContext {
    /// The open session
    pub workbench: Workbench,
    /// Surfaces of its tabs
    pub surfaces: Arc<ConsoleSurfaces>,
}

impl AppContext {
    /// Opens the persisted session described by the options.
    ///
    /// # Errors
    ///
    /// Returns an error if settings cannot be loaded, the HTTP client cannot
    /// be built, or the session cannot be opened.
    pub async fn open(global: &GlobalOptions) -> Result<Self, AppError> {
        let settings = load_settings(&settings_repository(global), global).await?;
        Self::with_settings(settings, global).await
    }

    /// Opens the session with already loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// cannot be opened.
    pub async fn with_settings(
        settings: WorkbenchSettings,
        global: &GlobalOptions,
    ) -> Result<Self, AppError> {
        let clock = Arc::new(SystemClock::new());
        let storage = PersistentStore::new(
            open_storage(global),
            clock.clone(),
            settings.storage_namespace.clone(),
        );
        let services = TabServices {
            transport: Arc::new(ReqwestTransport::new()?),
            clock,
            token_refresher: Some(Arc::new(OAuth2RefreshClient::new())),
            cors: CorsCache::new(),
            events: EventBus::default(),
        };
        let surfaces = Arc::new(ConsoleSurfaces::default());
        let workbench = Workbench::open(
            WorkbenchConfig::from_settings(settings),
            storage,
            services,
            surfaces.clone(),
        )
        .await?;
        Ok(Self {
            workbench,
            surfaces,
        })
    }
}
