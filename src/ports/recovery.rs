use std::path::{Path, PathBuf};

use crate::domain::{BackendKind, DomainError, ModelSize};

/// What the supervisor knows about a failed run, handed to recovery so
/// it can write a useful diagnostic artifact.
#[derive(Debug, Clone)]
pub struct RecoveryContext<'a> {
    /// Where the run's artifact must end up.
    pub output_path: &'a Path,
    /// Input audio the run was processing.
    pub audio_path: &'a Path,
    /// Backend that was active when the fault occurred, if any.
    pub backend: Option<BackendKind>,
    pub model: ModelSize,
}

/// Port for fault recovery.
///
/// Invoked only for non-cancellation faults. On success it returns the
/// path of the artifact it wrote. If recovery itself fails, the
/// supervisor writes a final generic fallback artifact on its own.
pub trait ErrorRecovery: Send + Sync {
    /// Attempt to produce a user-facing recovery artifact.
    fn recover(
        &self,
        error: &DomainError,
        context: &RecoveryContext<'_>,
    ) -> Result<PathBuf, DomainError>;
}
