//! Quality tiers and the adaptive controller
//!
//! - `QualityTier`: the four concrete rendering presets
//! - `QualityPreference`: user-facing setting that may also be "auto"
//! - Controller, subscriptions, profiles and configuration live in submodules

pub mod config;
pub mod controller;
pub mod profile;
pub mod subscription;

pub use config::*;
pub use controller::*;
pub use profile::*;
pub use subscription::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete rendering-quality tier, ordered from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    /// All tiers in ascending order
    pub const ALL: [QualityTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Ultra];

    /// Row index into per-tier tables
    pub const fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Ultra => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Ultra => "Ultra",
        }
    }

    /// Next tier up, wrapping from Ultra back to Low
    pub fn cycle(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Ultra,
            Self::Ultra => Self::Low,
        }
    }
}

impl Default for QualityTier {
    fn default() -> Self {
        Self::High
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown tier name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quality tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for QualityTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// Quality setting as chosen by the user or a config file.
///
/// `Auto` is a mode, not a tier: selecting it enables adaptive evaluation
/// while the controller keeps resolving to a concrete [`QualityTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreference {
    Auto,
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityPreference {
    /// Concrete tier pinned by this preference, `None` for `Auto`
    pub fn tier(self) -> Option<QualityTier> {
        match self {
            Self::Auto => None,
            Self::Low => Some(QualityTier::Low),
            Self::Medium => Some(QualityTier::Medium),
            Self::High => Some(QualityTier::High),
            Self::Ultra => Some(QualityTier::Ultra),
        }
    }
}

impl Default for QualityPreference {
    fn default() -> Self {
        Self::Auto
    }
}

impl From<QualityTier> for QualityPreference {
    fn from(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Low => Self::Low,
            QualityTier::Medium => Self::Medium,
            QualityTier::High => Self::High,
            QualityTier::Ultra => Self::Ultra,
        }
    }
}

impl FromStr for QualityPreference {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<QualityTier>().map(Self::from)
    }
}
