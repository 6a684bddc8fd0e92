use crate::domain::backend::BackendKind;
use thiserror::Error;

/// Domain-level errors for velosub.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    /// No backend anywhere in the chain could be loaded, CPU included.
    /// CPU loading is defined to always succeed, so this indicates a
    /// mis-built registry or chain rather than a runtime condition.
    #[error("Backend selection exhausted: {0}")]
    SelectionExhausted(String),

    /// An explicitly requested device id did not match any enumerated
    /// device or the CPU sentinel.
    #[error("Selected device not found: {0}")]
    InvalidUserSelection(String),

    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: BackendKind, reason: String },

    #[error("Backend {backend} failed validation: {reason}")]
    BackendValidationFailed { backend: BackendKind, reason: String },

    /// Opaque fault raised by the native inference engine while running.
    /// Only the message crosses the supervisor boundary.
    #[error("Inference engine fault: {0}")]
    EngineFault(String),

    /// Control-flow signal, not a fault: the job's cancellation flag was
    /// observed at a checkpoint. Never routed through error recovery.
    #[error("Cancellation requested")]
    Cancelled,

    #[error("Audio probe error: {0}")]
    Probe(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Recovery failed: {0}")]
    Recovery(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl DomainError {
    /// Whether this error is the cooperative cancellation signal rather
    /// than a genuine fault. Cancellation skips error recovery entirely.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
