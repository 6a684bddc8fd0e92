use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::domain::DomainError;
use crate::ports::{ArtifactWriter, ErrorRecovery, RecoveryContext};

/// Machine-readable failure report written in place of the transcript.
#[derive(Debug, Serialize)]
struct FailureReport {
    failed_at: String,
    input: String,
    model: String,
    backend: String,
    error: String,
}

/// Default recovery: writes a structured failure report where the
/// transcript would have gone, so the caller always finds a file at the
/// promised path.
pub struct DiagnosticRecovery {
    artifacts: Arc<dyn ArtifactWriter>,
}

impl DiagnosticRecovery {
    pub fn new(artifacts: Arc<dyn ArtifactWriter>) -> Self {
        Self { artifacts }
    }
}

impl ErrorRecovery for DiagnosticRecovery {
    fn recover(
        &self,
        error: &DomainError,
        context: &RecoveryContext<'_>,
    ) -> Result<PathBuf, DomainError> {
        let report = FailureReport {
            failed_at: Utc::now().to_rfc3339(),
            input: context.audio_path.display().to_string(),
            model: context.model.to_string(),
            backend: context
                .backend
                .map(|b| b.to_string())
                .unwrap_or_else(|| "unresolved".to_string()),
            error: error.to_string(),
        };
        let content = serde_json::to_string_pretty(&report)?;
        self.artifacts.write(context.output_path, &content)?;
        info!(path = ?context.output_path, "Diagnostic artifact written");
        Ok(context.output_path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use crate::adapters::FsArtifactWriter;
    use crate::domain::{BackendKind, ModelSize};

    #[test]
    fn test_report_names_error_and_backend() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.srt");
        let recovery = DiagnosticRecovery::new(Arc::new(FsArtifactWriter::new()));

        let context = RecoveryContext {
            output_path: &output,
            audio_path: Path::new("/audio/clip.wav"),
            backend: Some(BackendKind::Cuda),
            model: ModelSize::Medium,
        };
        let error = DomainError::EngineFault("device hung".to_string());
        let written = recovery.recover(&error, &context).unwrap();

        assert_eq!(written, output);
        let report = fs::read_to_string(&output).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("device hung"));
        assert_eq!(parsed["backend"], "CUDA");
        assert_eq!(parsed["model"], "medium");
    }

    #[test]
    fn test_unresolved_backend_is_named_as_such() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.srt");
        let recovery = DiagnosticRecovery::new(Arc::new(FsArtifactWriter::new()));

        let context = RecoveryContext {
            output_path: &output,
            audio_path: Path::new("/audio/clip.wav"),
            backend: None,
            model: ModelSize::Small,
        };
        recovery
            .recover(&DomainError::InvalidUserSelection("gpu-9".into()), &context)
            .unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed["backend"], "unresolved");
        assert!(parsed["error"].as_str().unwrap().contains("gpu-9"));
    }
}
