use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BackendDescriptor, ModelSize};

/// Progress callback invoked by the engine, 0.0..=100.0.
///
/// Called from whatever thread the engine runs on; implementations must
/// be cheap and non-blocking.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Parameters for one engine invocation.
#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Input audio file.
    pub audio_path: PathBuf,
    /// Model to run.
    pub model: ModelSize,
    /// Target language (ISO 639-1 code, e.g. "en", "fr").
    /// None for auto-detection.
    pub language: Option<String>,
    /// The backend the loader prepared; tells the engine which
    /// accelerator path to use.
    pub backend: BackendDescriptor,
    /// Number of threads to use (0 = auto).
    pub threads: u32,
}

/// Result of one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOutput {
    /// Transcribed text, subtitle-formatted by the engine.
    pub text: String,
    /// Detected language (ISO 639-1 code).
    pub detected_language: Option<String>,
}

/// Port for the native inference engine.
///
/// The engine is a long-running opaque collaborator: an invocation may
/// take minutes, reports progress only through the supplied callback,
/// and cannot be cancelled once started. Faults are opaque; the caller
/// maps them to a domain error with a human-readable message.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Run one transcription to completion.
    async fn invoke(&self, params: EngineParams, progress: ProgressFn)
        -> anyhow::Result<EngineOutput>;

    /// Human-readable engine name.
    fn name(&self) -> &str;
}
