use crate::domain::{
    CompatibilityVerdict, Device, DeviceCategory, DeviceMemory, ModelSize, Vendor,
};

use super::classifier::classify;

/// Score contribution for passing the vendor and capability gates.
const BASE_SCORE: u32 = 60;
/// Bonus for dedicated memory at or above 1.5x the model requirement.
const HEADROOM_BONUS: u32 = 20;
/// Bonus for a discrete card.
const DISCRETE_BONUS: u32 = 10;
/// Bonus for a driver at or above the known-good major version.
const DRIVER_BONUS: u32 = 10;

/// Minimum driver major version known to run the accelerated path well.
fn known_good_driver_major(vendor: Vendor) -> Option<u32> {
    match vendor {
        Vendor::Intel => Some(31),
        Vendor::Nvidia => Some(528),
        Vendor::Amd => Some(23),
        Vendor::Cpu => None,
    }
}

/// Leading numeric component of a driver version string.
///
/// "31.0.101.5186" -> 31, "528.49" -> 528. Returns None for "unknown"
/// or anything that does not start with a number.
fn driver_major(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

/// Check whether a device can run the given model on its native backend.
///
/// The verdict never short-circuits the caller: a rejection carries the
/// hard error, a pass carries a 0-100 preference score plus any
/// advisories. Rejections always score 0.
pub fn validate(device: &Device, model: ModelSize) -> CompatibilityVerdict {
    let backend = device.vendor.native_backend();

    if !device.vendor.supports_acceleration() {
        return CompatibilityVerdict::rejected(format!(
            "{} devices have no hardware acceleration path",
            device.vendor
        ));
    }

    if !device.capabilities.supports(backend) {
        return CompatibilityVerdict::rejected(format!(
            "{} has no {} acceleration support (runtime or driver missing)",
            device.display_name, backend
        ));
    }

    let required_mb = model.required_memory_mb();
    let mut score = BASE_SCORE;
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();

    match device.memory {
        DeviceMemory::Dedicated(mb) => {
            // Exact for all table entries: every requirement is even.
            let comfortable_mb = required_mb + required_mb / 2;
            if mb < required_mb {
                return CompatibilityVerdict::rejected(format!(
                    "insufficient dedicated memory: {} MiB available, {} requires {} MiB",
                    mb, model, required_mb
                ));
            } else if mb < comfortable_mb {
                warnings.push(format!(
                    "low dedicated memory headroom for {}: {} MiB available, {} MiB required",
                    model, mb, required_mb
                ));
            } else {
                score += HEADROOM_BONUS;
            }
        }
        DeviceMemory::Shared => {
            warnings.push(format!(
                "shared system memory: effective capacity unknown, assuming sufficient for {}",
                model
            ));
            if model == ModelSize::Large {
                recommendations.push(format!(
                    "prefer {} or smaller on shared-memory devices",
                    ModelSize::Medium
                ));
            }
        }
    }

    if classify(&device.display_name).category == DeviceCategory::Discrete {
        score += DISCRETE_BONUS;
    }

    match (
        driver_major(&device.driver_version),
        known_good_driver_major(device.vendor),
    ) {
        (Some(major), Some(minimum)) if major >= minimum => score += DRIVER_BONUS,
        (Some(major), Some(minimum)) => {
            recommendations.push(format!(
                "update the {} driver for best performance (found major {}, known good {}+)",
                device.vendor, major, minimum
            ));
        }
        _ => {
            recommendations.push(format!(
                "driver version unreported; install the latest {} driver",
                device.vendor
            ));
        }
    }

    let mut verdict = CompatibilityVerdict::supported(score);
    for warning in warnings {
        verdict = verdict.with_warning(warning);
    }
    for recommendation in recommendations {
        verdict = verdict.with_recommendation(recommendation);
    }
    verdict
}
