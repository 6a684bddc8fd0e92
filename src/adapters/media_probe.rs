use std::path::Path;

use tracing::debug;

use crate::domain::DomainError;
use crate::ports::MediaProbe;

/// WAV header probe. Reads the header only, never the sample data.
pub struct WavMediaProbe;

impl WavMediaProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WavMediaProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbe for WavMediaProbe {
    fn duration_ms(&self, path: &Path) -> Result<u64, DomainError> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| DomainError::Probe(format!("{}: {}", path.display(), e)))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(DomainError::Probe(format!(
                "{}: zero sample rate",
                path.display()
            )));
        }
        // duration() counts samples per channel, independent of layout.
        let frames = u64::from(reader.duration());
        let ms = frames * 1000 / u64::from(spec.sample_rate);
        debug!(path = ?path, ms, "Probed audio duration");
        Ok(ms)
    }
}
