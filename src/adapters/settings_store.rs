use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, DomainError};
use crate::ports::SettingsProvider;

/// Read-only TOML settings over the OS config directory.
///
/// Ownership of the file stays with the host application; the
/// transcription core only ever reads it. A missing file is not an
/// error, it means defaults.
pub struct TomlSettingsStore {
    config_dir: PathBuf,
}

impl TomlSettingsStore {
    /// Store rooted at the OS-specific config directory.
    /// - macOS: ~/Library/Application Support/velosub/
    /// - Windows: %APPDATA%\velosub\
    /// - Linux: ~/.config/velosub/
    pub fn new() -> Result<Self, DomainError> {
        let config_dir = dirs::config_dir()
            .map(|p| p.join("velosub"))
            .ok_or_else(|| {
                DomainError::Settings("could not resolve the OS config directory".to_string())
            })?;
        Ok(Self { config_dir })
    }

    /// Store rooted at an explicit directory.
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }
}

impl SettingsProvider for TomlSettingsStore {
    fn load(&self) -> Result<AppConfig, DomainError> {
        let path = self.config_path();
        if !path.exists() {
            debug!(path = ?path, "No settings file, using defaults");
            return Ok(AppConfig::default());
        }
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        info!(path = ?path, "Settings loaded");
        Ok(config)
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vendor;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::with_dir(dir.path());

        let config = store.load().unwrap();
        assert!(config.acceleration.allow_fallback);
        assert_eq!(config.transcription.model, "small");
    }

    #[test]
    fn test_load_reads_acceleration_section() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::with_dir(dir.path());
        fs::write(
            store.config_path(),
            r#"
            [acceleration]
            preference = ["nvidia", "cpu"]
            selected_device = "gpu-1"
            "#,
        )
        .unwrap();

        let config = store.load().unwrap();
        assert_eq!(
            config.acceleration.preference,
            vec![Vendor::Nvidia, Vendor::Cpu]
        );
        assert_eq!(config.acceleration.selected_device.as_deref(), Some("gpu-1"));
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlSettingsStore::with_dir(dir.path());
        fs::write(store.config_path(), "this is not toml = [").unwrap();

        assert!(matches!(store.load(), Err(DomainError::Config(_))));
    }
}
