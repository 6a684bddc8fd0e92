use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use super::backend::{BackendDescriptor, BackendKind};
use super::config::AppConfig;
use super::model::ModelSize;
use super::session::SessionMetrics;

/// Per-job state machine of the run supervisor.
///
/// Transitions:
/// - Pending -> Selecting (backend selection starts)
/// - Selecting -> Loading (a descriptor was chosen)
/// - Loading -> Running (a backend handle loaded and validated)
/// - Running -> Completed (engine returned, no cancellation pending)
/// - Running -> Cancelled (cancellation observed at a checkpoint)
/// - Selecting | Loading | Running -> Errored (unrecovered fault)
///
/// Completed, Cancelled and Errored are terminal. Cancellation is
/// cooperative: the engine call itself cannot be interrupted, so a cancel
/// requested mid-call is applied only after the call unblocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending = 0,
    Selecting = 1,
    Loading = 2,
    Running = 3,
    Completed = 4,
    Cancelled = 5,
    Errored = 6,
}

impl RunState {
    /// Whether the machine may move from `self` to `next`.
    #[must_use]
    pub fn can_transition(&self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Pending, Selecting)
                | (Selecting, Loading)
                | (Loading, Running)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Selecting, Errored)
                | (Loading, Errored)
                | (Running, Errored)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Errored
        )
    }

    /// Progress callbacks are forwarded only in this state.
    #[must_use]
    pub fn accepts_progress(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

impl From<u8> for RunState {
    fn from(value: u8) -> Self {
        match value {
            0 => RunState::Pending,
            1 => RunState::Selecting,
            2 => RunState::Loading,
            3 => RunState::Running,
            4 => RunState::Completed,
            5 => RunState::Cancelled,
            _ => RunState::Errored,
        }
    }
}

impl From<RunState> for u8 {
    fn from(state: RunState) -> Self {
        state as u8
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RunState::Pending => "pending",
            RunState::Selecting => "selecting",
            RunState::Loading => "loading",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Errored => "errored",
        };
        write!(f, "{}", label)
    }
}

/// Atomic wrapper for lock-free observation of a job's state.
#[derive(Debug)]
pub struct AtomicRunState(AtomicU8);

impl AtomicRunState {
    pub fn new(state: RunState) -> Self {
        Self(AtomicU8::new(state.into()))
    }

    pub fn load(&self) -> RunState {
        self.0.load(Ordering::Acquire).into()
    }

    pub fn store(&self, state: RunState) {
        self.0.store(state.into(), Ordering::Release);
    }
}

impl Default for AtomicRunState {
    fn default() -> Self {
        Self::new(RunState::Pending)
    }
}

/// One transcription job as submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Input audio file.
    pub audio_path: PathBuf,
    /// Where the output artifact must exist on every terminal state.
    pub output_path: PathBuf,
    pub model: ModelSize,
    /// ISO 639-1 language hint; None = auto-detect.
    pub language: Option<String>,
    /// Explicit device id override; bypasses the preference order.
    pub device_id: Option<String>,
}

impl RunRequest {
    pub fn new(audio_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, model: ModelSize) -> Self {
        Self {
            audio_path: audio_path.into(),
            output_path: output_path.into(),
            model,
            language: None,
            device_id: None,
        }
    }

    /// Request with model and language taken from configured defaults.
    /// The device override stays unset; the supervisor applies the
    /// configured `selected_device` on its own.
    pub fn from_defaults(
        audio_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        config: &AppConfig,
    ) -> Self {
        let mut request = Self::new(audio_path, output_path, config.transcription.model_size());
        request.language = config.transcription.language_hint();
        request
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

/// Terminal result of a run. An artifact exists at `artifact_path` for
/// every status, including cancellations and errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunState,
    pub artifact_path: PathBuf,
    /// The backend that actually ran (None when selection itself failed).
    pub backend: Option<BackendDescriptor>,
    pub metrics: Option<SessionMetrics>,
    /// Human-readable failure description; never raw error internals.
    pub error: Option<String>,
}

/// Events emitted by the supervisor while a job progresses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum RunEvent {
    /// Run state changed.
    StateChanged { from: RunState, to: RunState },
    /// A backend was chosen for the run.
    BackendResolved {
        backend: BackendKind,
        display_name: String,
        fallback_reason: Option<String>,
    },
    /// Engine progress, 0.0..=100.0. Only emitted while running and
    /// suppressed while the job is paused.
    Progress { percent: f32 },
    /// Terminal: transcript written.
    Completed {
        artifact: PathBuf,
        metrics: SessionMetrics,
    },
    /// Terminal: cancellation placeholder written.
    Cancelled { artifact: PathBuf },
    /// Terminal: recovery or fallback artifact written.
    Failed { message: String, artifact: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(RunState::Pending.can_transition(RunState::Selecting));
        assert!(RunState::Selecting.can_transition(RunState::Loading));
        assert!(RunState::Loading.can_transition(RunState::Running));
        assert!(RunState::Running.can_transition(RunState::Completed));
    }

    #[test]
    fn test_request_from_defaults_uses_configured_model_and_language() {
        let mut config = AppConfig::default();
        config.transcription.model = "medium".to_string();
        config.transcription.language = "de".to_string();
        let request = RunRequest::from_defaults("in.wav", "out.srt", &config);
        assert_eq!(request.model, ModelSize::Medium);
        assert_eq!(request.language.as_deref(), Some("de"));
        assert!(request.device_id.is_none());
    }

    #[test]
    fn test_cancel_only_from_running() {
        assert!(RunState::Running.can_transition(RunState::Cancelled));
        assert!(!RunState::Pending.can_transition(RunState::Cancelled));
        assert!(!RunState::Selecting.can_transition(RunState::Cancelled));
    }

    #[test]
    fn test_errored_reachable_from_active_states() {
        assert!(RunState::Selecting.can_transition(RunState::Errored));
        assert!(RunState::Loading.can_transition(RunState::Errored));
        assert!(RunState::Running.can_transition(RunState::Errored));
        assert!(!RunState::Pending.can_transition(RunState::Errored));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [RunState::Completed, RunState::Cancelled, RunState::Errored] {
            assert!(terminal.is_terminal());
            for next in [
                RunState::Pending,
                RunState::Selecting,
                RunState::Loading,
                RunState::Running,
                RunState::Completed,
                RunState::Cancelled,
                RunState::Errored,
            ] {
                assert!(!terminal.can_transition(next));
            }
        }
    }

    #[test]
    fn test_progress_only_while_running() {
        assert!(RunState::Running.accepts_progress());
        assert!(!RunState::Loading.accepts_progress());
        assert!(!RunState::Completed.accepts_progress());
    }

    #[test]
    fn test_atomic_state_round_trip() {
        let state = AtomicRunState::default();
        assert_eq!(state.load(), RunState::Pending);
        state.store(RunState::Running);
        assert_eq!(state.load(), RunState::Running);
    }

    #[test]
    fn test_unknown_u8_maps_to_errored() {
        assert_eq!(RunState::from(42u8), RunState::Errored);
    }
}
