use std::path::Path;

use crate::domain::DomainError;

/// Port for writing run output artifacts.
///
/// Used for the successful transcript and for every placeholder and
/// fallback output. The contract downstream code relies on: a run
/// always produces a file at its expected output path, even on total
/// failure, so "file exists" is a reliable post-condition.
pub trait ArtifactWriter: Send + Sync {
    /// Write `content` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, content: &str) -> Result<(), DomainError>;
}
