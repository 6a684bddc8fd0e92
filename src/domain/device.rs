use serde::{Deserialize, Serialize};

use super::backend::BackendKind;

/// GPU/accelerator vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Intel (Arc/Xe/UHD), the primary acceleration path (OpenVINO).
    Intel,
    /// NVIDIA (GeForce/RTX), CUDA path.
    Nvidia,
    /// AMD (Radeon), Vulkan path.
    Amd,
    /// No accelerator; plain CPU inference.
    Cpu,
}

impl Vendor {
    /// The backend this vendor's devices are driven through.
    pub fn native_backend(&self) -> BackendKind {
        match self {
            Vendor::Intel => BackendKind::OpenVino,
            Vendor::Nvidia => BackendKind::Cuda,
            Vendor::Amd => BackendKind::Vulkan,
            Vendor::Cpu => BackendKind::Cpu,
        }
    }

    /// Whether devices of this vendor can be accelerated at all.
    pub fn supports_acceleration(&self) -> bool {
        !matches!(self, Vendor::Cpu)
    }
}

impl std::str::FromStr for Vendor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intel" => Ok(Vendor::Intel),
            "nvidia" => Ok(Vendor::Nvidia),
            "amd" => Ok(Vendor::Amd),
            "cpu" => Ok(Vendor::Cpu),
            _ => Err(format!("Unknown vendor: {}", s)),
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Intel => write!(f, "Intel"),
            Vendor::Nvidia => write!(f, "NVIDIA"),
            Vendor::Amd => write!(f, "AMD"),
            Vendor::Cpu => write!(f, "CPU"),
        }
    }
}

/// Device category: dedicated card vs. iGPU sharing system memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    Discrete,
    Integrated,
}

impl std::fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCategory::Discrete => write!(f, "discrete"),
            DeviceCategory::Integrated => write!(f, "integrated"),
        }
    }
}

/// Device memory as reported by enumeration.
///
/// Integrated GPUs borrow system RAM and report no fixed size; that is the
/// `Shared` sentinel, which compatibility checks treat as "assume enough,
/// warn" rather than a hard number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMemory {
    /// Dedicated VRAM in MiB.
    Dedicated(u32),
    /// Shared with system memory; effective size unknown.
    Shared,
}

impl DeviceMemory {
    /// Dedicated size in MiB, if the device has its own memory.
    pub fn dedicated_mb(&self) -> Option<u32> {
        match self {
            DeviceMemory::Dedicated(mb) => Some(*mb),
            DeviceMemory::Shared => None,
        }
    }
}

impl std::fmt::Display for DeviceMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceMemory::Dedicated(mb) => write!(f, "{} MiB", mb),
            DeviceMemory::Shared => write!(f, "shared"),
        }
    }
}

/// Acceleration backends a device's driver stack exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelSupport {
    /// OpenVINO runtime (Intel path).
    pub openvino: bool,
    /// CUDA runtime (NVIDIA path).
    pub cuda: bool,
    /// Vulkan compute (AMD / generic path).
    pub vulkan: bool,
}

impl AccelSupport {
    /// Check support for a specific backend. CPU needs no device support.
    pub fn supports(&self, backend: BackendKind) -> bool {
        match backend {
            BackendKind::OpenVino => self.openvino,
            BackendKind::Cuda => self.cuda,
            BackendKind::Vulkan => self.vulkan,
            BackendKind::Cpu => true,
        }
    }
}

/// A detected compute device.
///
/// Devices are immutable snapshots produced by enumeration and shared
/// read-only across concurrent jobs; the core never mutates one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Stable identifier from the enumeration source.
    pub id: String,
    /// Free-text marketing name; the classification input.
    pub display_name: String,
    pub vendor: Vendor,
    pub memory: DeviceMemory,
    /// Driver version string, `"unknown"` when not reported.
    pub driver_version: String,
    pub capabilities: AccelSupport,
}

impl Device {
    /// Sentinel id resolving to the CPU backend in explicit selections.
    pub const CPU_SENTINEL_ID: &'static str = "cpu";
}

/// Relative performance tier derived from the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBand {
    Low,
    Medium,
    High,
}

/// Power-efficiency tier derived from the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerBand {
    Moderate,
    Good,
    Excellent,
}

/// GPU architecture family recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuFamily {
    /// Intel Arc A-series discrete (DG2).
    Alchemist,
    /// Intel Arc B-series discrete.
    Battlemage,
    /// Arc-branded integrated (Meteor Lake / Lunar Lake iGPU).
    XeLpg,
    /// Iris Xe / Xe integrated.
    Xe,
    /// UHD / HD Graphics generations.
    IntelLegacy,
    /// NVIDIA GeForce discrete.
    GeForce,
    /// AMD Radeon (discrete or integrated).
    Radeon,
    Unknown,
}

/// Structured classification of a device name.
///
/// `priority` is a monotonic integer used only for ordering devices against
/// one another; it carries no absolute meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: DeviceCategory,
    pub family: GpuFamily,
    pub performance: PerformanceBand,
    pub power: PowerBand,
    pub priority: u32,
}
