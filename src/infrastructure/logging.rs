use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::config::LoggingConfig;
use crate::domain::DomainError;

/// Initialize the logging system with console output and optional
/// daily-rotated JSON file output.
///
/// Returns a guard that must be kept alive for the duration of the
/// process; dropping it flushes any buffered file output.
pub fn init_logging(
    logs_dir: &Path,
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, DomainError> {
    if config.file_logging {
        fs::create_dir_all(logs_dir)?;
    }

    // RUST_LOG wins over the configured level.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("velosub={},warn", config.level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if config.file_logging {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("velosub")
            .filename_suffix("log")
            .max_log_files(config.max_files as usize)
            .build(logs_dir)
            .map_err(|e| DomainError::Config(format!("Failed to create log appender: {}", e)))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(EnvFilter::new(format!("velosub={}", config.level)));

        // try_init keeps a second initialization from panicking.
        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_ok()
        {
            tracing::info!(
                logs_dir = ?logs_dir,
                level = %config.level,
                "Logging initialized with file output"
            );
        }

        Ok(Some(guard))
    } else {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();

        tracing::info!(level = %config.level, "Logging initialized (console only)");

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logging_creates_logs_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");
        let config = LoggingConfig::default();

        // A prior test may own the global subscriber; directory setup
        // and guard creation must work regardless.
        let guard = init_logging(&logs_dir, &config).unwrap();
        assert!(logs_dir.exists());
        assert!(guard.is_some());
    }

    #[test]
    fn test_console_only_returns_no_guard() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file_logging: false,
            ..LoggingConfig::default()
        };

        let guard = init_logging(dir.path(), &config).unwrap();
        assert!(guard.is_none());
    }
}
