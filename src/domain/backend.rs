use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceCategory, DeviceMemory, PerformanceBand, PowerBand};

/// Acceleration backend implementations the engine can be driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Intel OpenVINO runtime.
    OpenVino,
    /// NVIDIA CUDA runtime.
    Cuda,
    /// Vulkan compute (AMD and generic GPUs).
    Vulkan,
    /// Plain CPU inference; the terminal fallback that always loads.
    Cpu,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::OpenVino => write!(f, "OpenVINO"),
            BackendKind::Cuda => write!(f, "CUDA"),
            BackendKind::Vulkan => write!(f, "Vulkan"),
            BackendKind::Cpu => write!(f, "CPU"),
        }
    }
}

/// Device binding carried by a descriptor; absent for the CPU backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Enumeration id of the bound device.
    pub device_id: String,
    pub memory: DeviceMemory,
    pub category: DeviceCategory,
}

/// The result of backend selection: which implementation to load and,
/// for accelerated backends, which device to bind it to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub backend: BackendKind,
    pub display_name: String,
    /// None exactly when `backend == Cpu`.
    pub device: Option<DeviceConfig>,
    /// Expected speedup over the CPU baseline; 1.0 for CPU itself.
    pub expected_speedup: f32,
    pub power: PowerBand,
    /// Set only when this descriptor stands in for a higher preference
    /// that was skipped or failed.
    pub fallback_reason: Option<String>,
    /// True when the user picked this device explicitly; explicit choices
    /// bypass preference order and compatibility re-validation.
    pub user_selected: bool,
}

impl BackendDescriptor {
    /// Descriptor for a device-bound accelerated backend.
    pub fn for_device(device: &Device, performance: PerformanceBand, power: PowerBand, category: DeviceCategory) -> Self {
        let backend = device.vendor.native_backend();
        Self {
            backend,
            display_name: device.display_name.clone(),
            device: Some(DeviceConfig {
                device_id: device.id.clone(),
                memory: device.memory,
                category,
            }),
            expected_speedup: expected_speedup(backend, performance),
            power,
            fallback_reason: None,
            user_selected: false,
        }
    }

    /// The CPU baseline descriptor.
    pub fn cpu() -> Self {
        Self {
            backend: BackendKind::Cpu,
            display_name: "CPU".to_string(),
            device: None,
            expected_speedup: 1.0,
            power: PowerBand::Good,
            fallback_reason: None,
            user_selected: false,
        }
    }

    /// CPU descriptor annotated with why higher preferences were skipped.
    pub fn cpu_fallback(reason: impl Into<String>) -> Self {
        let mut descriptor = Self::cpu();
        descriptor.fallback_reason = Some(reason.into());
        descriptor
    }

    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    pub fn as_user_selected(mut self) -> Self {
        self.user_selected = true;
        self
    }

    pub fn is_cpu(&self) -> bool {
        self.backend == BackendKind::Cpu
    }
}

/// Expected speedup over CPU for a backend driving a device of the given
/// performance band. Values are coarse planning numbers used for display
/// and descriptor ordering, never for metrics.
pub fn expected_speedup(backend: BackendKind, performance: PerformanceBand) -> f32 {
    match (backend, performance) {
        (BackendKind::Cpu, _) => 1.0,
        (BackendKind::OpenVino, PerformanceBand::High) => 8.0,
        (BackendKind::OpenVino, PerformanceBand::Medium) => 5.0,
        (BackendKind::OpenVino, PerformanceBand::Low) => 2.5,
        (BackendKind::Cuda, PerformanceBand::High) => 12.0,
        (BackendKind::Cuda, PerformanceBand::Medium) => 7.0,
        (BackendKind::Cuda, PerformanceBand::Low) => 3.0,
        (BackendKind::Vulkan, PerformanceBand::High) => 6.0,
        (BackendKind::Vulkan, PerformanceBand::Medium) => 4.0,
        (BackendKind::Vulkan, PerformanceBand::Low) => 2.0,
    }
}

/// Ordered list of backend candidates tried in sequence by the loader.
///
/// The last candidate is always CPU (the constructor appends it when the
/// caller didn't), so walking the chain cannot exhaust.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackChain {
    candidates: Vec<BackendDescriptor>,
}

impl FallbackChain {
    pub fn new(candidates: Vec<BackendDescriptor>) -> Self {
        let mut candidates = candidates;
        if !candidates.last().map(BackendDescriptor::is_cpu).unwrap_or(false) {
            candidates.push(BackendDescriptor::cpu_fallback(
                "all accelerated candidates failed to load",
            ));
        }
        Self { candidates }
    }

    /// Chain with a single candidate (plus the implicit CPU terminal).
    pub fn single(primary: BackendDescriptor) -> Self {
        Self::new(vec![primary])
    }

    pub fn candidates(&self) -> &[BackendDescriptor] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_descriptor_shape() {
        let cpu = BackendDescriptor::cpu();
        assert_eq!(cpu.backend, BackendKind::Cpu);
        assert!(cpu.device.is_none());
        assert_eq!(cpu.expected_speedup, 1.0);
        assert!(cpu.fallback_reason.is_none());
    }

    #[test]
    fn test_chain_always_ends_in_cpu() {
        let chain = FallbackChain::new(vec![]);
        assert_eq!(chain.len(), 1);
        assert!(chain.candidates()[0].is_cpu());

        let cuda = BackendDescriptor {
            backend: BackendKind::Cuda,
            display_name: "GeForce RTX 4070".to_string(),
            device: Some(DeviceConfig {
                device_id: "gpu-0".to_string(),
                memory: DeviceMemory::Dedicated(12_288),
                category: DeviceCategory::Discrete,
            }),
            expected_speedup: 12.0,
            power: PowerBand::Moderate,
            fallback_reason: None,
            user_selected: false,
        };
        let chain = FallbackChain::new(vec![cuda]);
        assert_eq!(chain.len(), 2);
        assert!(chain.candidates().last().unwrap().is_cpu());
    }

    #[test]
    fn test_chain_keeps_existing_cpu_terminal() {
        let chain = FallbackChain::new(vec![BackendDescriptor::cpu()]);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_speedup_at_least_baseline() {
        for backend in [
            BackendKind::OpenVino,
            BackendKind::Cuda,
            BackendKind::Vulkan,
            BackendKind::Cpu,
        ] {
            for band in [
                PerformanceBand::Low,
                PerformanceBand::Medium,
                PerformanceBand::High,
            ] {
                assert!(expected_speedup(backend, band) >= 1.0);
            }
        }
    }
}
