pub mod backend;
pub mod compatibility;
pub mod config;
pub mod device;
pub mod error;
pub mod model;
pub mod run;
pub mod session;

pub use backend::{expected_speedup, BackendDescriptor, BackendKind, DeviceConfig, FallbackChain};
pub use compatibility::CompatibilityVerdict;
pub use config::AppConfig;
pub use device::{
    AccelSupport, Classification, Device, DeviceCategory, DeviceMemory, GpuFamily,
    PerformanceBand, PowerBand, Vendor,
};
pub use error::DomainError;
pub use model::ModelSize;
pub use run::{AtomicRunState, RunEvent, RunOutcome, RunRequest, RunState};
pub use session::{
    BackendTrend, ModelAverages, PerformanceReport, Session, SessionId, SessionMetrics,
    SessionRecord, SessionStatus, CPU_BASELINE_REALTIME_RATIO,
};
