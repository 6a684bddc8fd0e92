use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Read-only source of user settings.
///
/// The core consults settings for the vendor preference order and the
/// explicitly selected device id; it never writes them back.
pub trait SettingsProvider: Send + Sync {
    /// Load the current configuration.
    /// Returns defaults if none has been persisted.
    fn load(&self) -> Result<AppConfig, DomainError>;

    /// Get the path to the configuration file.
    fn config_path(&self) -> PathBuf;

    /// Get the path to the logs directory.
    fn logs_dir(&self) -> PathBuf;
}
