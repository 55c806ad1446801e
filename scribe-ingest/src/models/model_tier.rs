//! Recognizer capability tiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named model-size configuration, smallest to largest
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelTier {
    /// Tier requested when the caller names none
    pub const REQUESTED_DEFAULT: ModelTier = ModelTier::Medium;
    /// Tier retried once when the requested tier fails to load
    pub const FALLBACK_DEFAULT: ModelTier = ModelTier::Base;

    pub const ALL: [ModelTier; 5] = [
        ModelTier::Tiny,
        ModelTier::Base,
        ModelTier::Small,
        ModelTier::Medium,
        ModelTier::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Tiny => "tiny",
            ModelTier::Base => "base",
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelTier::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == wanted)
            .ok_or_else(|| format!("unknown model tier '{}'", s))
    }
}
