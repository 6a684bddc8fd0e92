use serde::{Deserialize, Serialize};

use super::device::Vendor;
use super::model::ModelSize;

/// Hardware acceleration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelerationConfig {
    /// Vendor preference order for automatic backend selection.
    pub preference: Vec<Vendor>,
    /// Explicit device id chosen by the user; overrides `preference`.
    pub selected_device: Option<String>,
    /// When false, a failed preferred backend aborts instead of
    /// walking the fallback chain.
    pub allow_fallback: bool,
}

impl Default for AccelerationConfig {
    fn default() -> Self {
        Self {
            preference: Self::default_preference(),
            selected_device: None,
            allow_fallback: true,
        }
    }
}

impl AccelerationConfig {
    /// Default vendor order: integrated-friendly first, CPU last.
    pub fn default_preference() -> Vec<Vendor> {
        vec![Vendor::Intel, Vendor::Nvidia, Vendor::Cpu]
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Selected model size name (e.g. "tiny", "small", "large").
    pub model: String,
    /// Language code (e.g. "en", "fr", "auto").
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "small".to_string(),
            language: "auto".to_string(),
        }
    }
}

impl TranscriptionConfig {
    /// Configured default model; unknown ids fall back to Small.
    pub fn model_size(&self) -> ModelSize {
        self.model.parse().unwrap_or(ModelSize::Small)
    }

    /// Language hint for the engine. "auto" means detect.
    pub fn language_hint(&self) -> Option<String> {
        if self.language.eq_ignore_ascii_case("auto") {
            None
        } else {
            Some(self.language.clone())
        }
    }
}

/// Session monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Completed sessions retained for trend analysis.
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub acceleration: AccelerationConfig,
    pub transcription: TranscriptionConfig,
    pub monitor: MonitorConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
