use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::{
    BackendDescriptor, BackendKind, BackendTrend, DomainError, ModelAverages, ModelSize,
    PerformanceReport, Session, SessionId, SessionMetrics, SessionRecord, SessionStatus,
};

/// Number of most recent completed runs compared against the lifetime
/// average when looking for regressions.
const TREND_WINDOW: usize = 5;
/// A recent average below this share of the lifetime average counts as a
/// regression.
const REGRESSION_THRESHOLD: f64 = 0.9;
/// Peak memory above this share of the device's dedicated memory draws
/// an advisory.
const MEMORY_PRESSURE_THRESHOLD: f64 = 0.8;

/// Tracks live transcription sessions and a bounded rolling history of
/// finished ones.
///
/// Concurrent sessions are independent: the active map is the only
/// shared-write structure, and history appends are serialized behind the
/// write lock while reports read a snapshot.
pub struct PerformanceMonitor {
    active: Mutex<HashMap<SessionId, Session>>,
    history: RwLock<VecDeque<SessionRecord>>,
    history_capacity: usize,
}

impl PerformanceMonitor {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(history_capacity.min(64))),
            history_capacity,
        }
    }

    /// Begin monitoring one run. Sessions are independent; any number can
    /// be live at once.
    pub fn start_session(
        &self,
        backend: BackendDescriptor,
        model: ModelSize,
        audio_ref: impl Into<String>,
    ) -> SessionId {
        let session = Session::start(backend, model, audio_ref);
        let id = session.id;
        debug!(session = %id, model = %model, backend = %session.backend.backend, "Session started");
        self.active.lock().insert(id, session);
        id
    }

    /// Append a memory sample to a live session. Any polling cadence is
    /// fine, including none at all.
    pub fn record_memory_sample(&self, id: SessionId, used_mb: u32) -> Result<(), DomainError> {
        let mut active = self.active.lock();
        let session = active
            .get_mut(&id)
            .ok_or_else(|| DomainError::SessionNotFound(id.to_string()))?;
        session.memory_samples_mb.push(used_mb);
        Ok(())
    }

    /// Complete a session and fold it into history.
    ///
    /// Removing the session from the active map is what makes "ended
    /// exactly once" hold: a second end of the same id is
    /// `SessionNotFound`.
    pub fn end_session(
        &self,
        id: SessionId,
        audio_duration_ms: u64,
    ) -> Result<SessionMetrics, DomainError> {
        let session = self.take(id)?;
        let processing_ms = session.started.elapsed().as_millis() as u64;
        let metrics = SessionMetrics::compute(audio_duration_ms, processing_ms);
        info!(
            session = %id,
            processing_ms,
            speedup = metrics.speedup_factor,
            "Session completed"
        );
        self.append(session.into_record(
            SessionStatus::Completed,
            Some(audio_duration_ms),
            Some(metrics),
            None,
        ));
        Ok(metrics)
    }

    /// Finalize a session as errored. No speed metrics are computed and
    /// the record never contributes to speed aggregates.
    pub fn track_error(&self, id: SessionId, error: impl Into<String>) -> Result<(), DomainError> {
        let session = self.take(id)?;
        let message = error.into();
        warn!(session = %id, error = %message, "Session errored");
        self.append(session.into_record(SessionStatus::Errored, None, None, Some(message)));
        Ok(())
    }

    /// Finalize a session as cancelled; excluded from speed aggregates.
    pub fn track_cancelled(&self, id: SessionId) -> Result<(), DomainError> {
        let session = self.take(id)?;
        info!(session = %id, "Session cancelled");
        self.append(session.into_record(SessionStatus::Cancelled, None, None, None));
        Ok(())
    }

    pub fn active_sessions(&self) -> usize {
        self.active.lock().len()
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Aggregate the history into per-model averages, per-backend trends
    /// and advisory strings. Pure over a copy of the history, so reports
    /// never block appends for long.
    pub fn performance_report(&self) -> PerformanceReport {
        let snapshot: Vec<SessionRecord> = self.history.read().iter().cloned().collect();

        let completed: Vec<&SessionRecord> = snapshot
            .iter()
            .filter(|r| r.status.counts_toward_speed() && r.metrics.is_some())
            .collect();

        let averages = Self::model_averages(&completed);
        let trends = Self::backend_trends(&completed);
        let mut recommendations = Vec::new();

        for trend in trends.iter().filter(|t| t.regressing) {
            recommendations.push(format!(
                "{} runs of {} have slowed: recent average {:.1}x vs lifetime {:.1}x; check for driver or thermal issues",
                trend.backend, trend.model, trend.recent_avg_speedup, trend.lifetime_avg_speedup
            ));
        }

        for record in &completed {
            if let (Some(peak), Some(total)) = (record.peak_memory_mb, record.device_memory_mb) {
                if f64::from(peak) > f64::from(total) * MEMORY_PRESSURE_THRESHOLD {
                    let advice = format!(
                        "{} peaked at {} MiB of {} MiB running {}; consider a smaller model",
                        record.backend_name, peak, total, record.model
                    );
                    if !recommendations.contains(&advice) {
                        recommendations.push(advice);
                    }
                }
            }
        }

        PerformanceReport {
            generated_at: Utc::now(),
            total_sessions: snapshot.len(),
            completed_sessions: completed.len(),
            averages,
            trends,
            recommendations,
        }
    }

    fn take(&self, id: SessionId) -> Result<Session, DomainError> {
        self.active
            .lock()
            .remove(&id)
            .ok_or_else(|| DomainError::SessionNotFound(id.to_string()))
    }

    /// Single-writer append with oldest-first eviction at capacity.
    fn append(&self, record: SessionRecord) {
        let mut history = self.history.write();
        history.push_back(record);
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    fn model_averages(completed: &[&SessionRecord]) -> Vec<ModelAverages> {
        let mut averages = Vec::new();
        for model in ModelSize::ALL {
            let speedups: Vec<f64> = completed
                .iter()
                .filter(|r| r.model == model)
                .filter_map(|r| r.metrics.map(|m| m.speedup_factor))
                .collect();
            if speedups.is_empty() {
                continue;
            }
            let processing: Vec<f64> = completed
                .iter()
                .filter(|r| r.model == model)
                .filter_map(|r| r.metrics.map(|m| m.processing_ms as f64))
                .collect();
            averages.push(ModelAverages {
                model,
                runs: speedups.len(),
                avg_speedup: mean(&speedups),
                avg_processing_ms: mean(&processing),
            });
        }
        averages
    }

    fn backend_trends(completed: &[&SessionRecord]) -> Vec<BackendTrend> {
        // History order is append order, so per-group vectors stay
        // chronological and the window is genuinely "most recent".
        let mut groups: Vec<(BackendKind, ModelSize)> = Vec::new();
        let mut speedups: HashMap<(BackendKind, ModelSize), Vec<f64>> = HashMap::new();
        for record in completed {
            let key = (record.backend, record.model);
            if !speedups.contains_key(&key) {
                groups.push(key);
            }
            if let Some(metrics) = record.metrics {
                speedups.entry(key).or_default().push(metrics.speedup_factor);
            }
        }

        groups
            .into_iter()
            .map(|(backend, model)| {
                let series = &speedups[&(backend, model)];
                let lifetime = mean(series);
                let window = series.len().min(TREND_WINDOW);
                let recent = mean(&series[series.len() - window..]);
                BackendTrend {
                    backend,
                    model,
                    runs: series.len(),
                    lifetime_avg_speedup: lifetime,
                    recent_avg_speedup: recent,
                    regressing: recent < lifetime * REGRESSION_THRESHOLD,
                }
            })
            .collect()
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(crate::domain::config::MonitorConfig::default().history_capacity)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
