mod builder;

pub use builder::SupervisorBuilder;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::{
    AtomicRunState, BackendDescriptor, DomainError, FallbackChain, RunEvent, RunOutcome,
    RunRequest, RunState, SessionId, SessionMetrics,
};
use crate::loader::BackendLoader;
use crate::monitor::PerformanceMonitor;
use crate::ports::{
    ArtifactWriter, DeviceEnumerator, ErrorRecovery, InferenceEngine, MediaProbe, ProgressFn,
    RecoveryContext, SettingsProvider, DEFAULT_AUDIO_DURATION_MS,
};
use crate::selection::{BackendSelector, DeviceInventory};

/// Buffered events per job; slow subscribers lag rather than block.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Cooperative controls for one job.
///
/// Cancellation is advisory: the flag is checked before the engine is
/// invoked and again after it returns, because the engine itself cannot
/// be interrupted mid-call. Pause only suppresses progress forwarding;
/// the engine keeps running.
#[derive(Debug, Default)]
pub struct JobControl {
    cancel: AtomicBool,
    pause: AtomicBool,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.pause.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::Acquire)
    }
}

/// Handle to a spawned job: controls, event subscription and the result.
pub struct JobHandle {
    control: Arc<JobControl>,
    events: broadcast::Sender<RunEvent>,
    join: JoinHandle<RunOutcome>,
}

impl JobHandle {
    pub fn control(&self) -> Arc<JobControl> {
        Arc::clone(&self.control)
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.control.request_cancel();
    }

    /// Suppress or resume progress event forwarding.
    pub fn set_paused(&self, paused: bool) {
        self.control.set_paused(paused);
    }

    /// Subscribe to the job's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Wait for the job to reach a terminal state. A task aborted by
    /// runtime shutdown surfaces as `Cancelled`.
    pub async fn wait(self) -> Result<RunOutcome, DomainError> {
        self.join.await.map_err(|e| {
            if e.is_cancelled() {
                DomainError::Cancelled
            } else {
                DomainError::EngineFault(format!("run task failed: {}", e))
            }
        })
    }
}

/// Drives one transcription run through its full lifecycle.
///
/// All collaborators are injected; the supervisor owns no devices, no
/// engine and no storage of its own. Independent runs are independent
/// tasks sharing only the monitor, so they need no further coordination.
pub struct TranscriptionSupervisor {
    enumerator: Arc<dyn DeviceEnumerator>,
    engine: Arc<dyn InferenceEngine>,
    probe: Arc<dyn MediaProbe>,
    artifacts: Arc<dyn ArtifactWriter>,
    recovery: Arc<dyn ErrorRecovery>,
    settings: Arc<dyn SettingsProvider>,
    selector: BackendSelector,
    loader: BackendLoader,
    monitor: Arc<PerformanceMonitor>,
}

impl TranscriptionSupervisor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        enumerator: Arc<dyn DeviceEnumerator>,
        engine: Arc<dyn InferenceEngine>,
        probe: Arc<dyn MediaProbe>,
        artifacts: Arc<dyn ArtifactWriter>,
        recovery: Arc<dyn ErrorRecovery>,
        settings: Arc<dyn SettingsProvider>,
        loader: BackendLoader,
        monitor: Arc<PerformanceMonitor>,
    ) -> Self {
        Self {
            enumerator,
            engine,
            probe,
            artifacts,
            recovery,
            settings,
            selector: BackendSelector::new(),
            loader,
            monitor,
        }
    }

    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Run one job to a terminal state on the current task.
    ///
    /// The returned outcome always names an artifact path that was
    /// written to, whatever the terminal state.
    pub async fn run(&self, request: RunRequest, control: Arc<JobControl>) -> RunOutcome {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        self.drive(request, control, events).await
    }

    /// Spawn a job as a tokio task and return its handle.
    pub fn spawn(self: &Arc<Self>, request: RunRequest) -> JobHandle {
        let control = Arc::new(JobControl::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let supervisor = Arc::clone(self);
        let task_control = Arc::clone(&control);
        let task_events = events.clone();
        let join =
            tokio::spawn(async move { supervisor.drive(request, task_control, task_events).await });
        JobHandle {
            control,
            events,
            join,
        }
    }

    async fn drive(
        &self,
        request: RunRequest,
        control: Arc<JobControl>,
        events: broadcast::Sender<RunEvent>,
    ) -> RunOutcome {
        let state = AtomicRunState::default();
        info!(
            audio = %request.audio_path.display(),
            output = %request.output_path.display(),
            model = %request.model,
            "Run accepted"
        );

        let config = self.settings.load().unwrap_or_else(|e| {
            warn!(error = %e, "Settings unavailable, using defaults");
            Default::default()
        });

        // Pending -> Selecting
        self.transition(&state, RunState::Selecting, &events);

        let devices = self.enumerator.enumerate().unwrap_or_else(|e| {
            warn!(error = %e, "Device enumeration failed, treating as zero devices");
            Vec::new()
        });
        let inventory = DeviceInventory::new(devices);

        let explicit_id = request
            .device_id
            .clone()
            .or_else(|| config.acceleration.selected_device.clone());

        let descriptor = match explicit_id {
            Some(id) => match self.selector.resolve_specific(&id, &inventory) {
                Some(descriptor) => descriptor,
                None => {
                    return self
                        .errored(
                            &state,
                            &events,
                            &request,
                            None,
                            None,
                            DomainError::InvalidUserSelection(id),
                        )
                        .await;
                }
            },
            None => self.selector.select_optimal(
                &config.acceleration.preference,
                &inventory,
                request.model,
            ),
        };

        // Selecting -> Loading
        self.transition(&state, RunState::Loading, &events);

        let loaded = if config.acceleration.allow_fallback {
            self.loader
                .load_with_fallback(&FallbackChain::single(descriptor))
        } else {
            let single = descriptor.clone();
            self.loader.load(&descriptor).map(|handle| {
                crate::loader::LoadedBackend {
                    handle,
                    descriptor: single,
                    attempts: Vec::new(),
                }
            })
        };
        let loaded = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                return self.errored(&state, &events, &request, None, None, e).await;
            }
        };
        let descriptor = loaded.descriptor.clone();
        let _ = events.send(RunEvent::BackendResolved {
            backend: descriptor.backend,
            display_name: descriptor.display_name.clone(),
            fallback_reason: descriptor.fallback_reason.clone(),
        });

        // Loading -> Running
        self.transition(&state, RunState::Running, &events);
        let session_id = self.monitor.start_session(
            descriptor.clone(),
            request.model,
            request.audio_path.display().to_string(),
        );

        let audio_duration_ms = self
            .probe
            .duration_ms(&request.audio_path)
            .unwrap_or_else(|e| {
                debug!(error = %e, "Audio probe failed, using default duration");
                DEFAULT_AUDIO_DURATION_MS
            });

        // First cancellation checkpoint: before the engine is invoked.
        if control.cancel_requested() {
            return self
                .cancelled(&state, &events, &request, session_id, descriptor)
                .await;
        }

        let progress = self.progress_bridge(&control, &events);
        // Per-request language wins over the configured default.
        let language = request
            .language
            .clone()
            .or_else(|| config.transcription.language_hint());
        let params = crate::ports::EngineParams {
            audio_path: request.audio_path.clone(),
            model: request.model,
            language,
            backend: descriptor.clone(),
            threads: 0,
        };
        let engine_result = self.engine.invoke(params, progress).await;

        // Second checkpoint: the engine cannot be interrupted, so a
        // cancel that arrived mid-call is applied now, result or not.
        if control.cancel_requested() {
            return self
                .cancelled(&state, &events, &request, session_id, descriptor)
                .await;
        }

        match engine_result {
            Ok(output) => {
                if let Err(e) = self.artifacts.write(&request.output_path, &output.text) {
                    return self
                        .errored(
                            &state,
                            &events,
                            &request,
                            Some(session_id),
                            Some(descriptor),
                            e,
                        )
                        .await;
                }
                let metrics = self.end_session(session_id, audio_duration_ms);
                // Running -> Completed
                self.transition(&state, RunState::Completed, &events);
                let _ = events.send(RunEvent::Completed {
                    artifact: request.output_path.clone(),
                    metrics,
                });
                info!(
                    artifact = %request.output_path.display(),
                    speedup = metrics.speedup_factor,
                    "Run completed"
                );
                RunOutcome {
                    status: RunState::Completed,
                    artifact_path: request.output_path.clone(),
                    backend: Some(descriptor),
                    metrics: Some(metrics),
                    error: None,
                }
            }
            Err(fault) => {
                self.errored(
                    &state,
                    &events,
                    &request,
                    Some(session_id),
                    Some(descriptor),
                    DomainError::EngineFault(fault.to_string()),
                )
                .await
            }
        }
    }

    /// Forward engine progress to subscribers, only while not paused.
    ///
    /// The callback runs solely during the engine call, which is
    /// entirely inside `Running`, so the state gate is structural.
    fn progress_bridge(
        &self,
        control: &Arc<JobControl>,
        events: &broadcast::Sender<RunEvent>,
    ) -> ProgressFn {
        let control = Arc::clone(control);
        let events = events.clone();
        Arc::new(move |percent: f32| {
            if !control.is_paused() {
                let _ = events.send(RunEvent::Progress { percent });
            }
        })
    }

    /// Running -> Cancelled. Writes the placeholder artifact and
    /// finalizes the session outside the speed aggregates.
    async fn cancelled(
        &self,
        state: &AtomicRunState,
        events: &broadcast::Sender<RunEvent>,
        request: &RunRequest,
        session_id: SessionId,
        descriptor: BackendDescriptor,
    ) -> RunOutcome {
        self.transition(state, RunState::Cancelled, events);
        if let Err(e) = self.monitor.track_cancelled(session_id) {
            warn!(session = %session_id, error = %e, "Could not finalize cancelled session");
        }
        let placeholder = format!(
            "[cancelled] transcription of {} was cancelled before completion\n",
            request.audio_path.display()
        );
        if let Err(e) = self.artifacts.write(&request.output_path, &placeholder) {
            error!(error = %e, "Failed to write cancellation placeholder");
        }
        let _ = events.send(RunEvent::Cancelled {
            artifact: request.output_path.clone(),
        });
        info!(artifact = %request.output_path.display(), "Run cancelled");
        RunOutcome {
            status: RunState::Cancelled,
            artifact_path: request.output_path.clone(),
            backend: Some(descriptor),
            metrics: None,
            error: None,
        }
    }

    /// {Selecting|Loading|Running} -> Errored. Marks the session (when
    /// one was started), runs recovery, and guarantees an artifact
    /// either way before surfacing the error message.
    async fn errored(
        &self,
        state: &AtomicRunState,
        events: &broadcast::Sender<RunEvent>,
        request: &RunRequest,
        session_id: Option<SessionId>,
        descriptor: Option<BackendDescriptor>,
        fault: DomainError,
    ) -> RunOutcome {
        self.transition(state, RunState::Errored, events);
        let message = fault.to_string();
        error!(error = %message, "Run failed");

        if let Some(id) = session_id {
            if let Err(e) = self.monitor.track_error(id, message.clone()) {
                warn!(session = %id, error = %e, "Could not finalize errored session");
            }
        }

        let context = RecoveryContext {
            output_path: &request.output_path,
            audio_path: &request.audio_path,
            backend: descriptor.as_ref().map(|d| d.backend),
            model: request.model,
        };
        let artifact_path = match self.recovery.recover(&fault, &context) {
            Ok(path) => path,
            Err(recovery_error) => {
                warn!(error = %recovery_error, "Recovery failed, writing generic fallback artifact");
                let fallback = format!("[failed] transcription failed: {}\n", message);
                if let Err(write_error) = self.artifacts.write(&request.output_path, &fallback) {
                    error!(error = %write_error, "Failed to write fallback artifact");
                }
                request.output_path.clone()
            }
        };

        let _ = events.send(RunEvent::Failed {
            message: message.clone(),
            artifact: artifact_path.clone(),
        });
        RunOutcome {
            status: RunState::Errored,
            artifact_path,
            backend: descriptor,
            metrics: None,
            error: Some(message),
        }
    }

    fn end_session(&self, session_id: SessionId, audio_duration_ms: u64) -> SessionMetrics {
        match self.monitor.end_session(session_id, audio_duration_ms) {
            Ok(metrics) => metrics,
            Err(e) => {
                // Unreachable when the supervisor is the only caller
                // ending this id; keep the run alive regardless.
                warn!(session = %session_id, error = %e, "Could not finalize session");
                SessionMetrics::compute(audio_duration_ms, 0)
            }
        }
    }

    fn transition(
        &self,
        state: &AtomicRunState,
        to: RunState,
        events: &broadcast::Sender<RunEvent>,
    ) {
        let from = state.load();
        if !from.can_transition(to) {
            warn!(from = %from, to = %to, "Unexpected run state transition");
        }
        state.store(to);
        debug!(from = %from, to = %to, "Run state changed");
        let _ = events.send(RunEvent::StateChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use crate::domain::{
        AccelSupport, AppConfig, BackendKind, Device, DeviceMemory, ModelSize, Vendor,
    };
    use crate::loader::BackendRegistry;
    use crate::ports::{EngineOutput, EngineParams};

    struct FixedEnumerator {
        devices: Vec<Device>,
    }

    impl DeviceEnumerator for FixedEnumerator {
        fn enumerate(&self) -> Result<Vec<Device>, DomainError> {
            Ok(self.devices.clone())
        }
    }

    enum EngineScript {
        Succeed { text: String, progress: Vec<f32> },
        Fail { message: String },
        CancelMidCall { control: Arc<JobControl> },
    }

    struct ScriptedEngine {
        script: EngineScript,
        invocations: AtomicUsize,
    }

    impl ScriptedEngine {
        fn new(script: EngineScript) -> Arc<Self> {
            Arc::new(Self {
                script,
                invocations: AtomicUsize::new(0),
            })
        }

        fn invocations(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl InferenceEngine for ScriptedEngine {
        async fn invoke(
            &self,
            _params: EngineParams,
            progress: ProgressFn,
        ) -> anyhow::Result<EngineOutput> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                EngineScript::Succeed { text, progress: points } => {
                    for p in points {
                        progress(*p);
                    }
                    Ok(EngineOutput {
                        text: text.clone(),
                        detected_language: Some("en".to_string()),
                    })
                }
                EngineScript::Fail { message } => Err(anyhow::anyhow!("{}", message)),
                EngineScript::CancelMidCall { control } => {
                    control.request_cancel();
                    Ok(EngineOutput {
                        text: "should be discarded".to_string(),
                        detected_language: None,
                    })
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedProbe {
        duration_ms: Option<u64>,
    }

    impl MediaProbe for FixedProbe {
        fn duration_ms(&self, _path: &Path) -> Result<u64, DomainError> {
            self.duration_ms
                .ok_or_else(|| DomainError::Probe("unreadable header".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(PathBuf, String)>>,
        fail: bool,
    }

    impl RecordingWriter {
        fn failing() -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn last_content_for(&self, path: &Path) -> Option<String> {
            self.writes
                .lock()
                .iter()
                .rev()
                .find(|(p, _)| p == path)
                .map(|(_, c)| c.clone())
        }
    }

    impl ArtifactWriter for RecordingWriter {
        fn write(&self, path: &Path, content: &str) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::Artifact("disk full".to_string()));
            }
            self.writes
                .lock()
                .push((path.to_path_buf(), content.to_string()));
            Ok(())
        }
    }

    struct ScriptedRecovery {
        artifacts: Arc<RecordingWriter>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl ScriptedRecovery {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ErrorRecovery for ScriptedRecovery {
        fn recover(
            &self,
            error: &DomainError,
            context: &RecoveryContext<'_>,
        ) -> Result<PathBuf, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DomainError::Recovery("diagnostic collection failed".into()));
            }
            let report = format!("[recovered] {}\n", error);
            self.artifacts.write(context.output_path, &report)?;
            Ok(context.output_path.to_path_buf())
        }
    }

    struct FixedSettings {
        config: AppConfig,
    }

    impl SettingsProvider for FixedSettings {
        fn load(&self) -> Result<AppConfig, DomainError> {
            Ok(self.config.clone())
        }

        fn config_path(&self) -> PathBuf {
            PathBuf::from("/tmp/velosub-test.toml")
        }

        fn logs_dir(&self) -> PathBuf {
            PathBuf::from("/tmp")
        }
    }

    fn arc_a770() -> Device {
        Device {
            id: "gpu-0".to_string(),
            display_name: "Intel(R) Arc(TM) A770 Graphics".to_string(),
            vendor: Vendor::Intel,
            memory: DeviceMemory::Dedicated(16_384),
            driver_version: "31.0.101.5186".to_string(),
            capabilities: AccelSupport {
                openvino: true,
                cuda: false,
                vulkan: false,
            },
        }
    }

    struct Harness {
        engine: Arc<ScriptedEngine>,
        writer: Arc<RecordingWriter>,
        recovery: Arc<ScriptedRecovery>,
        supervisor: Arc<TranscriptionSupervisor>,
    }

    fn harness(
        devices: Vec<Device>,
        script: EngineScript,
        writer: RecordingWriter,
        recovery_fails: bool,
        config: AppConfig,
    ) -> Harness {
        let engine = ScriptedEngine::new(script);
        let writer = Arc::new(writer);
        let recovery = Arc::new(ScriptedRecovery {
            artifacts: Arc::clone(&writer),
            fail: recovery_fails,
            calls: AtomicUsize::new(0),
        });
        let supervisor = Arc::new(TranscriptionSupervisor::new(
            Arc::new(FixedEnumerator { devices }),
            engine.clone() as Arc<dyn InferenceEngine>,
            Arc::new(FixedProbe {
                duration_ms: Some(120_000),
            }),
            writer.clone() as Arc<dyn ArtifactWriter>,
            recovery.clone() as Arc<dyn ErrorRecovery>,
            Arc::new(FixedSettings { config }),
            BackendLoader::new(BackendRegistry::new()),
            Arc::new(PerformanceMonitor::new(16)),
        ));
        Harness {
            engine,
            writer,
            recovery,
            supervisor,
        }
    }

    fn request() -> RunRequest {
        RunRequest::new("/audio/clip.wav", "/out/clip.srt", ModelSize::Small)
    }

    #[tokio::test]
    async fn test_completed_run_writes_transcript() {
        // No accelerator providers registered: the chain lands on CPU,
        // which always loads.
        let h = harness(
            vec![arc_a770()],
            EngineScript::Succeed {
                text: "1\n00:00:00,000 --> 00:00:02,000\nhello\n".to_string(),
                progress: vec![50.0],
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let outcome = h
            .supervisor
            .run(request(), Arc::new(JobControl::new()))
            .await;

        assert_eq!(outcome.status, RunState::Completed);
        assert_eq!(outcome.artifact_path, PathBuf::from("/out/clip.srt"));
        assert!(outcome.metrics.is_some());
        assert!(outcome.error.is_none());
        let content = h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .unwrap();
        assert!(content.contains("hello"));
        assert_eq!(h.supervisor.monitor().history_len(), 1);
        assert_eq!(h.supervisor.monitor().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_cancel_before_invoke_skips_engine_and_writes_placeholder() {
        let h = harness(
            vec![],
            EngineScript::Succeed {
                text: "never".to_string(),
                progress: vec![],
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let control = Arc::new(JobControl::new());
        control.request_cancel();
        let outcome = h.supervisor.run(request(), control).await;

        assert_eq!(outcome.status, RunState::Cancelled);
        assert_eq!(h.engine.invocations(), 0);
        let content = h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .unwrap();
        assert!(!content.is_empty());
        assert!(content.contains("cancelled"));
        // The session is finalized exactly once, as cancelled.
        assert_eq!(h.supervisor.monitor().history_len(), 1);
        assert_eq!(h.supervisor.monitor().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_engine_applied_post_hoc() {
        let control = Arc::new(JobControl::new());
        let h = harness(
            vec![],
            EngineScript::CancelMidCall {
                control: Arc::clone(&control),
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let outcome = h.supervisor.run(request(), control).await;

        assert_eq!(h.engine.invocations(), 1);
        assert_eq!(outcome.status, RunState::Cancelled);
        // The engine's result is discarded; the artifact is the
        // cancellation placeholder.
        let content = h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .unwrap();
        assert!(content.contains("cancelled"));
        assert!(!content.contains("discarded"));
    }

    #[tokio::test]
    async fn test_engine_fault_routes_through_recovery() {
        let h = harness(
            vec![],
            EngineScript::Fail {
                message: "device hung".to_string(),
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let outcome = h
            .supervisor
            .run(request(), Arc::new(JobControl::new()))
            .await;

        assert_eq!(outcome.status, RunState::Errored);
        assert_eq!(h.recovery.calls(), 1);
        let message = outcome.error.unwrap();
        assert!(message.contains("device hung"));
        let content = h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .unwrap();
        assert!(content.contains("recovered"));
        // Errored session is in history, not active.
        assert_eq!(h.supervisor.monitor().history_len(), 1);
        assert_eq!(h.supervisor.monitor().active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_failed_recovery_still_writes_fallback_artifact() {
        let h = harness(
            vec![],
            EngineScript::Fail {
                message: "device hung".to_string(),
            },
            RecordingWriter::default(),
            true,
            AppConfig::default(),
        );

        let outcome = h
            .supervisor
            .run(request(), Arc::new(JobControl::new()))
            .await;

        assert_eq!(outcome.status, RunState::Errored);
        assert_eq!(outcome.artifact_path, PathBuf::from("/out/clip.srt"));
        let content = h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .unwrap();
        assert!(content.contains("failed"));
    }

    #[tokio::test]
    async fn test_unknown_explicit_device_errors_without_session() {
        let h = harness(
            vec![arc_a770()],
            EngineScript::Succeed {
                text: "never".to_string(),
                progress: vec![],
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let outcome = h
            .supervisor
            .run(request().with_device("gpu-99"), Arc::new(JobControl::new()))
            .await;

        assert_eq!(outcome.status, RunState::Errored);
        assert!(outcome.error.unwrap().contains("gpu-99"));
        assert_eq!(h.engine.invocations(), 0);
        // Selection failed before any session started.
        assert_eq!(h.supervisor.monitor().history_len(), 0);
        // Recovery still produced the artifact.
        assert!(h
            .writer
            .last_content_for(Path::new("/out/clip.srt"))
            .is_some());
    }

    #[tokio::test]
    async fn test_progress_forwarded_and_suppressed_by_pause() {
        let h = harness(
            vec![],
            EngineScript::Succeed {
                text: "done".to_string(),
                progress: vec![25.0, 75.0],
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        // Unpaused: progress flows.
        let handle = h.supervisor.spawn(request());
        let mut events = handle.subscribe();
        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.status, RunState::Completed);
        let mut seen_progress = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, RunEvent::Progress { .. }) {
                seen_progress += 1;
            }
        }
        assert_eq!(seen_progress, 2);

        // Paused: same engine script, no progress events forwarded.
        let handle = h.supervisor.spawn(request());
        handle.set_paused(true);
        let mut events = handle.subscribe();
        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.status, RunState::Completed);
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, RunEvent::Progress { .. }));
        }
    }

    #[tokio::test]
    async fn test_no_devices_falls_back_to_cpu_with_reason() {
        let h = harness(
            vec![],
            EngineScript::Succeed {
                text: "cpu transcript".to_string(),
                progress: vec![],
            },
            RecordingWriter::default(),
            false,
            AppConfig::default(),
        );

        let handle = h.supervisor.spawn(request());
        let mut events = handle.subscribe();
        let outcome = handle.wait().await.unwrap();

        assert_eq!(outcome.status, RunState::Completed);
        let backend = outcome.backend.unwrap();
        assert_eq!(backend.backend, BackendKind::Cpu);
        assert!(backend.fallback_reason.is_some());

        let mut resolved_reason = None;
        while let Ok(event) = events.try_recv() {
            if let RunEvent::BackendResolved {
                fallback_reason, ..
            } = event
            {
                resolved_reason = fallback_reason;
            }
        }
        assert!(resolved_reason.is_some());
    }

    #[tokio::test]
    async fn test_probe_failure_uses_default_duration() {
        let engine = ScriptedEngine::new(EngineScript::Succeed {
            text: "ok".to_string(),
            progress: vec![],
        });
        let writer = Arc::new(RecordingWriter::default());
        let recovery = Arc::new(ScriptedRecovery {
            artifacts: Arc::clone(&writer),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let supervisor = Arc::new(TranscriptionSupervisor::new(
            Arc::new(FixedEnumerator { devices: vec![] }),
            engine.clone() as Arc<dyn InferenceEngine>,
            Arc::new(FixedProbe { duration_ms: None }),
            writer.clone() as Arc<dyn ArtifactWriter>,
            recovery as Arc<dyn ErrorRecovery>,
            Arc::new(FixedSettings {
                config: AppConfig::default(),
            }),
            BackendLoader::new(BackendRegistry::new()),
            Arc::new(PerformanceMonitor::new(16)),
        ));

        let outcome = supervisor.run(request(), Arc::new(JobControl::new())).await;
        assert_eq!(outcome.status, RunState::Completed);
        // Metrics exist even though the probe failed.
        assert!(outcome.metrics.unwrap().speedup_factor > 0.0);
    }

    #[tokio::test]
    async fn test_transcript_write_failure_errors_the_run() {
        let h = harness(
            vec![],
            EngineScript::Succeed {
                text: "text that cannot be persisted".to_string(),
                progress: vec![],
            },
            RecordingWriter::failing(),
            true,
            AppConfig::default(),
        );

        let outcome = h
            .supervisor
            .run(request(), Arc::new(JobControl::new()))
            .await;

        assert_eq!(outcome.status, RunState::Errored);
        assert!(outcome.error.is_some());
        // Session was started and must be finalized exactly once.
        assert_eq!(h.supervisor.monitor().history_len(), 1);
        assert_eq!(h.supervisor.monitor().active_sessions(), 0);
    }
}
