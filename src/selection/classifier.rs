use crate::domain::{Classification, DeviceCategory, GpuFamily, PerformanceBand, PowerBand};

/// One row of the classification table.
///
/// `pattern` is matched as a lowercase substring of the device name.
struct ClassificationRule {
    pattern: &'static str,
    category: DeviceCategory,
    family: GpuFamily,
    performance: PerformanceBand,
    power: PowerBand,
    priority: u32,
}

impl ClassificationRule {
    const fn classification(&self) -> Classification {
        Classification {
            category: self.category,
            family: self.family,
            performance: self.performance,
            power: self.power,
            priority: self.priority,
        }
    }
}

const fn rule(
    pattern: &'static str,
    category: DeviceCategory,
    family: GpuFamily,
    performance: PerformanceBand,
    power: PowerBand,
    priority: u32,
) -> ClassificationRule {
    ClassificationRule {
        pattern,
        category,
        family,
        performance,
        power,
        priority,
    }
}

/// Ordered rule table, evaluated top to bottom; first match wins.
///
/// Ordering constraints baked into the rows:
/// - "uhd graphics" before "hd graphics" (substring containment),
/// - "iris xe" and "arc graphics" before "xe graphics" / generic rows,
/// - discrete rows before every integrated row.
///
/// Priorities order devices against each other: discrete tiers sit above
/// Arc-branded integrated, which sits above legacy integrated.
static RULES: &[ClassificationRule] = &[
    // Intel Arc B-series discrete (Battlemage)
    rule("b580", DeviceCategory::Discrete, GpuFamily::Battlemage, PerformanceBand::High, PowerBand::Moderate, 95),
    rule("b570", DeviceCategory::Discrete, GpuFamily::Battlemage, PerformanceBand::High, PowerBand::Moderate, 93),
    // Intel Arc A-series discrete (Alchemist)
    rule("a770", DeviceCategory::Discrete, GpuFamily::Alchemist, PerformanceBand::High, PowerBand::Moderate, 90),
    rule("a750", DeviceCategory::Discrete, GpuFamily::Alchemist, PerformanceBand::High, PowerBand::Moderate, 85),
    rule("a580", DeviceCategory::Discrete, GpuFamily::Alchemist, PerformanceBand::Medium, PowerBand::Moderate, 80),
    rule("a380", DeviceCategory::Discrete, GpuFamily::Alchemist, PerformanceBand::Medium, PowerBand::Moderate, 70),
    rule("a310", DeviceCategory::Discrete, GpuFamily::Alchemist, PerformanceBand::Low, PowerBand::Moderate, 65),
    // NVIDIA GeForce discrete, by generation
    rule("rtx 50", DeviceCategory::Discrete, GpuFamily::GeForce, PerformanceBand::High, PowerBand::Moderate, 92),
    rule("rtx 40", DeviceCategory::Discrete, GpuFamily::GeForce, PerformanceBand::High, PowerBand::Moderate, 88),
    rule("rtx 30", DeviceCategory::Discrete, GpuFamily::GeForce, PerformanceBand::High, PowerBand::Moderate, 82),
    rule("rtx 20", DeviceCategory::Discrete, GpuFamily::GeForce, PerformanceBand::Medium, PowerBand::Moderate, 72),
    rule("gtx 16", DeviceCategory::Discrete, GpuFamily::GeForce, PerformanceBand::Medium, PowerBand::Moderate, 60),
    // AMD Radeon discrete, by generation
    rule("rx 7", DeviceCategory::Discrete, GpuFamily::Radeon, PerformanceBand::High, PowerBand::Moderate, 86),
    rule("rx 6", DeviceCategory::Discrete, GpuFamily::Radeon, PerformanceBand::Medium, PowerBand::Moderate, 76),
    // Arc-branded integrated (Lunar Lake / Meteor Lake iGPU)
    rule("arc 140v", DeviceCategory::Integrated, GpuFamily::XeLpg, PerformanceBand::Medium, PowerBand::Excellent, 42),
    rule("arc 130v", DeviceCategory::Integrated, GpuFamily::XeLpg, PerformanceBand::Medium, PowerBand::Excellent, 41),
    rule("arc graphics", DeviceCategory::Integrated, GpuFamily::XeLpg, PerformanceBand::Medium, PowerBand::Excellent, 40),
    // Legacy integrated
    rule("iris xe", DeviceCategory::Integrated, GpuFamily::Xe, PerformanceBand::Low, PowerBand::Good, 30),
    rule("xe graphics", DeviceCategory::Integrated, GpuFamily::Xe, PerformanceBand::Low, PowerBand::Good, 28),
    rule("iris plus", DeviceCategory::Integrated, GpuFamily::IntelLegacy, PerformanceBand::Low, PowerBand::Good, 25),
    rule("uhd graphics", DeviceCategory::Integrated, GpuFamily::IntelLegacy, PerformanceBand::Low, PowerBand::Good, 20),
    rule("radeon graphics", DeviceCategory::Integrated, GpuFamily::Radeon, PerformanceBand::Low, PowerBand::Good, 18),
    rule("hd graphics", DeviceCategory::Integrated, GpuFamily::IntelLegacy, PerformanceBand::Low, PowerBand::Good, 15),
];

/// Classification for names no rule recognizes.
const FALLBACK: Classification = Classification {
    category: DeviceCategory::Integrated,
    family: GpuFamily::Unknown,
    performance: PerformanceBand::Low,
    power: PowerBand::Good,
    priority: 1,
};

/// Classify a free-text device name into category, family and bands.
///
/// Deterministic and total: matching is case-insensitive against the
/// ordered rule table, and unrecognized names get the conservative
/// integrated fallback instead of an error.
pub fn classify(name: &str) -> Classification {
    let lowered = name.to_lowercase();
    for rule in RULES {
        if lowered.contains(rule.pattern) {
            return rule.classification();
        }
    }
    FALLBACK
}
