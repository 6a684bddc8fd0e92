use std::fs;
use std::path::Path;

use tracing::debug;

use crate::domain::DomainError;
use crate::ports::ArtifactWriter;

/// Filesystem artifact writer. Missing parent directories are created,
/// existing files overwritten.
pub struct FsArtifactWriter;

impl FsArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FsArtifactWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactWriter for FsArtifactWriter {
    fn write(&self, path: &Path, content: &str) -> Result<(), DomainError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        debug!(path = ?path, bytes = content.len(), "Artifact written");
        Ok(())
    }
}
