use serde::{Deserialize, Serialize};

/// Structured accept/reject decision for a (device, model) pair.
///
/// Invariants, enforced by the constructors:
/// - `supported == false` implies `score == 0`
/// - a non-empty `errors` list implies `supported == false`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    pub supported: bool,
    /// 0-100; 0 exactly when unsupported.
    pub score: u8,
    /// Hard blockers. Non-empty only on unsupported verdicts.
    pub errors: Vec<String>,
    /// Soft risks, e.g. marginal memory.
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CompatibilityVerdict {
    /// A passing verdict. The score is capped at 100.
    pub fn supported(score: u32) -> Self {
        Self {
            supported: true,
            score: score.min(100) as u8,
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// A hard rejection; the score collapses to zero.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            supported: false,
            score: 0,
            errors: vec![error.into()],
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }
}
