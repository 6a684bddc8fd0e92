use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::domain::{Device, DomainError};
use crate::ports::DeviceEnumerator;

/// Enumerator over an externally supplied device snapshot.
///
/// Device discovery itself belongs to the host (OS APIs, driver
/// queries); this adapter holds whatever the host last reported. The
/// snapshot swaps atomically, so a job that already enumerated keeps
/// working with the list it started from.
pub struct StaticDeviceEnumerator {
    devices: RwLock<Arc<Vec<Device>>>,
}

impl StaticDeviceEnumerator {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: RwLock::new(Arc::new(devices)),
        }
    }

    /// Enumerator reporting no devices; selection falls back to CPU.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Replace the snapshot, e.g. after a hotplug notification.
    pub fn replace(&self, devices: Vec<Device>) {
        info!(count = devices.len(), "Device snapshot replaced");
        *self.devices.write() = Arc::new(devices);
    }

    pub fn snapshot(&self) -> Arc<Vec<Device>> {
        Arc::clone(&self.devices.read())
    }
}

impl DeviceEnumerator for StaticDeviceEnumerator {
    fn enumerate(&self) -> Result<Vec<Device>, DomainError> {
        let snapshot = self.snapshot();
        debug!(count = snapshot.len(), "Devices enumerated");
        Ok(snapshot.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccelSupport, DeviceMemory, Vendor};

    fn device(id: &str) -> Device {
        Device {
            id: id.to_string(),
            display_name: "Intel Arc A770".to_string(),
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

    #[test]
    fn test_replace_swaps_the_visible_list() {
        let enumerator = StaticDeviceEnumerator::empty();
        assert!(enumerator.enumerate().unwrap().is_empty());

        enumerator.replace(vec![device("gpu-0"), device("gpu-1")]);
        assert_eq!(enumerator.enumerate().unwrap().len(), 2);
    }

    #[test]
    fn test_old_snapshot_survives_replace() {
        let enumerator = StaticDeviceEnumerator::new(vec![device("gpu-0")]);
        let held = enumerator.snapshot();
        enumerator.replace(Vec::new());
        assert_eq!(held.len(), 1);
        assert!(enumerator.enumerate().unwrap().is_empty());
    }
}
