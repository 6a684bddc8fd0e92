use tracing::{debug, info, warn};

use crate::domain::{
    BackendDescriptor, Classification, Device, DeviceCategory, ModelSize, Vendor,
};

use super::classifier::classify;
use super::validator::validate;

/// Immutable snapshot of one enumeration pass.
///
/// Jobs hold the snapshot they started with; a refreshed enumeration
/// produces a new inventory rather than mutating this one. Enumeration
/// order is preserved and serves as the final ranking tie-break.
#[derive(Debug, Clone, Default)]
pub struct DeviceInventory {
    devices: Vec<Device>,
}

impl DeviceInventory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Exact-id lookup, the resolution path for explicit user choices.
    pub fn find(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Devices of one vendor, best first: discrete before integrated,
    /// then classifier priority, then dedicated memory. The sort is
    /// stable, so enumeration order breaks remaining ties.
    fn ranked_for(&self, vendor: Vendor) -> Vec<(&Device, Classification)> {
        let mut ranked: Vec<(&Device, Classification)> = self
            .devices
            .iter()
            .filter(|d| d.vendor == vendor)
            .map(|d| (d, classify(&d.display_name)))
            .collect();
        ranked.sort_by(|(a, ca), (b, cb)| {
            category_rank(ca.category)
                .cmp(&category_rank(cb.category))
                .then_with(|| cb.priority.cmp(&ca.priority))
                .then_with(|| {
                    let mem_a = a.memory.dedicated_mb().unwrap_or(0);
                    let mem_b = b.memory.dedicated_mb().unwrap_or(0);
                    mem_b.cmp(&mem_a)
                })
        });
        ranked
    }
}

fn category_rank(category: DeviceCategory) -> u8 {
    match category {
        DeviceCategory::Discrete => 0,
        DeviceCategory::Integrated => 1,
    }
}

/// Chooses which backend a run should use.
///
/// Selection is pure over its inputs: the preference order and device
/// inventory come from the caller, so concurrent jobs can select against
/// different snapshots without coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendSelector;

impl BackendSelector {
    pub fn new() -> Self {
        Self
    }

    /// Walk the vendor preference order and return the best backend.
    ///
    /// Total: when every accelerator preference is exhausted the CPU
    /// descriptor is returned with a reason naming what was skipped, so
    /// callers can always proceed.
    pub fn select_optimal(
        &self,
        preference: &[Vendor],
        inventory: &DeviceInventory,
        model: ModelSize,
    ) -> BackendDescriptor {
        let mut skipped: Vec<String> = Vec::new();

        for &vendor in preference {
            if vendor == Vendor::Cpu {
                return if skipped.is_empty() {
                    BackendDescriptor::cpu()
                } else {
                    BackendDescriptor::cpu_fallback(skipped.join("; "))
                };
            }

            let ranked = inventory.ranked_for(vendor);
            if ranked.is_empty() {
                debug!(vendor = %vendor, "No devices detected for preferred vendor");
                skipped.push(format!("no {} devices detected", vendor));
                continue;
            }

            for (device, classification) in ranked {
                let verdict = validate(device, model);
                if verdict.supported {
                    info!(
                        device = %device.display_name,
                        backend = %vendor.native_backend(),
                        score = verdict.score,
                        "Selected backend"
                    );
                    let descriptor = BackendDescriptor::for_device(
                        device,
                        classification.performance,
                        classification.power,
                        classification.category,
                    );
                    return if skipped.is_empty() {
                        descriptor
                    } else {
                        descriptor.with_fallback_reason(skipped.join("; "))
                    };
                }
                debug!(
                    device = %device.display_name,
                    errors = ?verdict.errors,
                    "Device failed compatibility check"
                );
            }
            skipped.push(format!(
                "no {} device met the requirements of {}",
                vendor, model
            ));
        }

        if skipped.is_empty() {
            skipped.push("vendor preference order is empty".to_string());
        }
        let reason = skipped.join("; ");
        warn!(reason = %reason, "Preference order exhausted, using CPU");
        BackendDescriptor::cpu_fallback(reason)
    }

    /// Resolve an explicit device or backend id chosen by the user.
    ///
    /// The id is matched verbatim against the inventory plus the literal
    /// `"cpu"` sentinel. Unknown ids return `None` rather than an error;
    /// known ids are honored without re-validation, marginal or not.
    pub fn resolve_specific(
        &self,
        id: &str,
        inventory: &DeviceInventory,
    ) -> Option<BackendDescriptor> {
        if id == Device::CPU_SENTINEL_ID {
            return Some(BackendDescriptor::cpu().as_user_selected());
        }
        let device = inventory.find(id)?;
        let classification = classify(&device.display_name);
        info!(device = %device.display_name, id = %id, "Resolved user-selected device");
        Some(
            BackendDescriptor::for_device(
                device,
                classification.performance,
                classification.power,
                classification.category,
            )
            .as_user_selected(),
        )
    }
}
