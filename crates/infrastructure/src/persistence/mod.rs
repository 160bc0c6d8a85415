//! Persistence implementations for the key-value storage port and settings.

mod file_storage;
mod memory_storage;
mod settings_repository;

pub use file_storage::FileKeyValueStorage;
pub use memory_storage::MemoryKeyValueStorage;
pub use settings_repository::{APP_DIR, SettingsError, SettingsRepository};
