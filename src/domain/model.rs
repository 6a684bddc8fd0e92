use serde::{Deserialize, Serialize};

/// Whisper model size selected for a transcription run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    /// All sizes, smallest first.
    pub const ALL: [ModelSize; 5] = [
        ModelSize::Tiny,
        ModelSize::Base,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::Large,
    ];

    /// Memory footprint required to run inference, in MiB.
    ///
    /// Numbers follow the whisper.cpp published requirements; the table is
    /// strictly monotonic in model size.
    pub fn required_memory_mb(&self) -> u32 {
        match self {
            ModelSize::Tiny => 390,
            ModelSize::Base => 500,
            ModelSize::Small => 1_000,
            ModelSize::Medium => 2_600,
            ModelSize::Large => 4_700,
        }
    }

    /// The next size down, used for downgrade recommendations.
    pub fn smaller(&self) -> Option<ModelSize> {
        match self {
            ModelSize::Tiny => None,
            ModelSize::Base => Some(ModelSize::Tiny),
            ModelSize::Small => Some(ModelSize::Base),
            ModelSize::Medium => Some(ModelSize::Small),
            ModelSize::Large => Some(ModelSize::Medium),
        }
    }

    /// Canonical id string (the serialized form).
    pub fn id(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl std::str::FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiny" | "tiny.en" => Ok(ModelSize::Tiny),
            "base" | "base.en" => Ok(ModelSize::Base),
            "small" | "small.en" => Ok(ModelSize::Small),
            "medium" | "medium.en" => Ok(ModelSize::Medium),
            // Large revisions share one footprint class.
            "large" | "large-v1" | "large-v2" | "large-v3" => Ok(ModelSize::Large),
            _ => Err(format!("Unknown model size: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
