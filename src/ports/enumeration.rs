use crate::domain::{Device, DomainError};

/// Port for compute device discovery.
///
/// Implementations query the platform (driver APIs, sysfs, WMI) for
/// accelerator devices. Enumeration may fail or time out; callers treat
/// that as "no devices available", never as a fatal error.
pub trait DeviceEnumerator: Send + Sync {
    /// Enumerate currently visible compute devices.
    ///
    /// Order is preserved and used as the final selection tie-break.
    fn enumerate(&self) -> Result<Vec<Device>, DomainError>;
}
