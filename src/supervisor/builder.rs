use std::sync::Arc;

use tracing::{info, warn};

use crate::adapters::{DiagnosticRecovery, FsArtifactWriter, TomlSettingsStore, WavMediaProbe};
use crate::domain::DomainError;
use crate::loader::{BackendLoader, BackendRegistry};
use crate::monitor::PerformanceMonitor;
use crate::ports::{
    ArtifactWriter, DeviceEnumerator, ErrorRecovery, InferenceEngine, MediaProbe, SettingsProvider,
};
use crate::supervisor::TranscriptionSupervisor;

/// Composition root for the supervisor.
///
/// The engine and the device enumerator are host-specific and must be
/// supplied; every other collaborator defaults to the bundled adapter.
#[derive(Default)]
pub struct SupervisorBuilder {
    enumerator: Option<Arc<dyn DeviceEnumerator>>,
    engine: Option<Arc<dyn InferenceEngine>>,
    probe: Option<Arc<dyn MediaProbe>>,
    artifacts: Option<Arc<dyn ArtifactWriter>>,
    recovery: Option<Arc<dyn ErrorRecovery>>,
    settings: Option<Arc<dyn SettingsProvider>>,
    registry: Option<BackendRegistry>,
    monitor: Option<Arc<PerformanceMonitor>>,
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enumerator(mut self, enumerator: Arc<dyn DeviceEnumerator>) -> Self {
        self.enumerator = Some(enumerator);
        self
    }

    pub fn engine(mut self, engine: Arc<dyn InferenceEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn artifacts(mut self, artifacts: Arc<dyn ArtifactWriter>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn recovery(mut self, recovery: Arc<dyn ErrorRecovery>) -> Self {
        self.recovery = Some(recovery);
        self
    }

    pub fn settings(mut self, settings: Arc<dyn SettingsProvider>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Registry of loadable backends; defaults to CPU-only.
    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn build(self) -> Result<TranscriptionSupervisor, DomainError> {
        let engine = self
            .engine
            .ok_or_else(|| DomainError::Config("an inference engine is required".to_string()))?;
        let enumerator = self
            .enumerator
            .ok_or_else(|| DomainError::Config("a device enumerator is required".to_string()))?;

        let settings: Arc<dyn SettingsProvider> = match self.settings {
            Some(settings) => settings,
            None => Arc::new(TomlSettingsStore::new()?),
        };
        let config = settings.load().unwrap_or_else(|e| {
            warn!(error = %e, "Settings unavailable at build time, using defaults");
            Default::default()
        });

        let artifacts: Arc<dyn ArtifactWriter> = self
            .artifacts
            .unwrap_or_else(|| Arc::new(FsArtifactWriter::new()));
        let recovery: Arc<dyn ErrorRecovery> = self
            .recovery
            .unwrap_or_else(|| Arc::new(DiagnosticRecovery::new(Arc::clone(&artifacts))));
        let probe: Arc<dyn MediaProbe> =
            self.probe.unwrap_or_else(|| Arc::new(WavMediaProbe::new()));
        let registry = self.registry.unwrap_or_default();
        let monitor = self.monitor.unwrap_or_else(|| {
            Arc::new(PerformanceMonitor::new(config.monitor.history_capacity))
        });

        info!(
            engine = engine.name(),
            backends = ?registry.available_kinds(),
            "Supervisor assembled"
        );
        Ok(TranscriptionSupervisor::new(
            enumerator,
            engine,
            probe,
            artifacts,
            recovery,
            settings,
            BackendLoader::new(registry),
            monitor,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticDeviceEnumerator;
    use crate::ports::{EngineOutput, EngineParams, ProgressFn};

    struct NoopEngine;

    #[async_trait::async_trait]
    impl InferenceEngine for NoopEngine {
        async fn invoke(
            &self,
            _params: EngineParams,
            _progress: ProgressFn,
        ) -> anyhow::Result<EngineOutput> {
            Ok(EngineOutput {
                text: String::new(),
                detected_language: None,
            })
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_engine_is_required() {
        let result = SupervisorBuilder::new()
            .enumerator(Arc::new(StaticDeviceEnumerator::empty()))
            .build();
        assert!(matches!(result, Err(DomainError::Config(_))));
    }

    #[test]
    fn test_enumerator_is_required() {
        let result = SupervisorBuilder::new().engine(Arc::new(NoopEngine)).build();
        assert!(matches!(result, Err(DomainError::Config(_))));
    }

    #[test]
    fn test_build_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = SupervisorBuilder::new()
            .engine(Arc::new(NoopEngine))
            .enumerator(Arc::new(StaticDeviceEnumerator::empty()))
            .settings(Arc::new(TomlSettingsStore::with_dir(dir.path())))
            .build()
            .unwrap();
        assert_eq!(supervisor.monitor().active_sessions(), 0);
    }
}
