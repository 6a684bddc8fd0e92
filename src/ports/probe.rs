use std::path::Path;

use crate::domain::DomainError;

/// Duration assumed when probing fails; keeps speed metrics defined
/// without blocking the run on a broken media file.
pub const DEFAULT_AUDIO_DURATION_MS: u64 = 60_000;

/// Port for best-effort media duration probing.
pub trait MediaProbe: Send + Sync {
    /// Duration of the audio file in milliseconds.
    ///
    /// Best-effort: callers fall back to `DEFAULT_AUDIO_DURATION_MS`
    /// on error instead of failing the run.
    fn duration_ms(&self, path: &Path) -> Result<u64, DomainError>;
}
