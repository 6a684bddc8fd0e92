pub mod artifact;
pub mod engine;
pub mod enumeration;
pub mod probe;
pub mod recovery;
pub mod settings;

pub use artifact::ArtifactWriter;
pub use engine::{EngineOutput, EngineParams, InferenceEngine, ProgressFn};
pub use enumeration::DeviceEnumerator;
pub use probe::{MediaProbe, DEFAULT_AUDIO_DURATION_MS};
pub use recovery::{ErrorRecovery, RecoveryContext};
pub use settings::SettingsProvider;
