#![forbid(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod loader;
pub mod monitor;
pub mod ports;
pub mod selection;
pub mod supervisor;

pub use domain::{
    AccelSupport, AppConfig, BackendDescriptor, BackendKind, CompatibilityVerdict, Device,
    DeviceMemory, DomainError, FallbackChain, ModelSize, PerformanceReport, RunEvent, RunOutcome,
    RunRequest, RunState, SessionId, SessionMetrics, Vendor,
};
pub use infrastructure::init_logging;
pub use loader::{BackendHandle, BackendLoader, BackendProvider, BackendRegistry, LoadedBackend};
pub use monitor::PerformanceMonitor;
pub use ports::{
    ArtifactWriter, DeviceEnumerator, EngineOutput, EngineParams, ErrorRecovery, InferenceEngine,
    MediaProbe, ProgressFn, RecoveryContext, SettingsProvider,
};
pub use selection::{classify, validate, BackendSelector, DeviceInventory};
pub use supervisor::{JobControl, JobHandle, SupervisorBuilder, TranscriptionSupervisor};
