use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::backend::{BackendDescriptor, BackendKind};
use super::model::ModelSize;

/// Real-time ratio of the CPU baseline. The CPU path transcribes at
/// roughly 1x real time, which makes it the definitional baseline: a
/// session's speedup factor is its real-time ratio divided by this.
pub const CPU_BASELINE_REALTIME_RATIO: f64 = 1.0;

/// Opaque per-run monitoring id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one monitored transcription run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Errored,
    Cancelled,
}

impl SessionStatus {
    /// Whether this session contributes to speed aggregates. Errored and
    /// cancelled runs are kept in history but excluded from trends.
    pub fn counts_toward_speed(&self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Derived timing metrics for a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub processing_ms: u64,
    /// Audio duration divided by wall-clock processing time.
    pub real_time_ratio: f64,
    /// Real-time ratio normalized against the CPU baseline.
    pub speedup_factor: f64,
}

impl SessionMetrics {
    /// Pure metric computation; a run that processed `audio_duration_ms`
    /// of audio in `audio_duration_ms / k` milliseconds yields a speedup
    /// factor of `k`.
    pub fn compute(audio_duration_ms: u64, processing_ms: u64) -> Self {
        // Sub-millisecond runs clamp to 1ms so the ratios stay finite.
        let effective_ms = processing_ms.max(1);
        let real_time_ratio = audio_duration_ms as f64 / effective_ms as f64;
        Self {
            processing_ms,
            real_time_ratio,
            speedup_factor: real_time_ratio / CPU_BASELINE_REALTIME_RATIO,
        }
    }
}

/// A live monitoring record, mutated only by the monitor for its own id.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub backend: BackendDescriptor,
    pub model: ModelSize,
    /// Display reference to the audio being processed.
    pub audio_ref: String,
    pub started_at: DateTime<Utc>,
    /// Monotonic start used for duration math.
    pub started: Instant,
    pub memory_samples_mb: Vec<u32>,
    pub status: SessionStatus,
}

impl Session {
    pub fn start(backend: BackendDescriptor, model: ModelSize, audio_ref: impl Into<String>) -> Self {
        Self {
            id: SessionId::generate(),
            backend,
            model,
            audio_ref: audio_ref.into(),
            started_at: Utc::now(),
            started: Instant::now(),
            memory_samples_mb: Vec::new(),
            status: SessionStatus::Running,
        }
    }

    pub fn peak_memory_mb(&self) -> Option<u32> {
        self.memory_samples_mb.iter().copied().max()
    }

    /// Freeze this session into an immutable history entry.
    pub fn into_record(
        self,
        status: SessionStatus,
        audio_duration_ms: Option<u64>,
        metrics: Option<SessionMetrics>,
        error: Option<String>,
    ) -> SessionRecord {
        SessionRecord {
            id: self.id,
            backend: self.backend.backend,
            backend_name: self.backend.display_name.clone(),
            device_memory_mb: self
                .backend
                .device
                .as_ref()
                .and_then(|d| d.memory.dedicated_mb()),
            model: self.model,
            audio_ref: self.audio_ref,
            started_at: self.started_at,
            status,
            audio_duration_ms,
            peak_memory_mb: self.memory_samples_mb.iter().copied().max(),
            metrics,
            error,
        }
    }
}

/// Immutable finalized session kept in the rolling history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub backend: BackendKind,
    pub backend_name: String,
    /// Dedicated memory of the bound device, when it had any.
    pub device_memory_mb: Option<u32>,
    pub model: ModelSize,
    pub audio_ref: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub audio_duration_ms: Option<u64>,
    pub peak_memory_mb: Option<u32>,
    pub metrics: Option<SessionMetrics>,
    pub error: Option<String>,
}

/// Per-model aggregate over completed sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAverages {
    pub model: ModelSize,
    pub runs: usize,
    pub avg_speedup: f64,
    pub avg_processing_ms: f64,
}

/// Speed trend for one backend running one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendTrend {
    pub backend: BackendKind,
    pub model: ModelSize,
    pub runs: usize,
    pub lifetime_avg_speedup: f64,
    /// Average over the most recent window of runs.
    pub recent_avg_speedup: f64,
    /// True when the recent average fell below 90% of the lifetime one.
    pub regressing: bool,
}

/// Aggregated view over the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub averages: Vec<ModelAverages>,
    pub trends: Vec<BackendTrend>,
    pub recommendations: Vec<String>,
}
