//! Adaptive controller configuration and on-disk settings
//!
//! `AdaptiveConfig` is only ever replaced by a validated copy: a partial
//! `AdaptiveConfigUpdate` is merged onto the active config and the merge is
//! rejected as a whole if it breaks threshold ordering.

use super::QualityPreference;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default evaluation cycles between tier transitions
pub const DEFAULT_STABILITY_WINDOW: u32 = 60;
/// Default hysteresis margin in FPS
pub const DEFAULT_HYSTERESIS_FPS: f64 = 5.0;
/// Default frame-rate target
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Per-tier FPS boundaries; must be strictly ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FpsThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub ultra: f64,
}

impl Default for FpsThresholds {
    fn default() -> Self {
        Self {
            low: 30.0,
            medium: 45.0,
            high: 55.0,
            ultra: 60.0,
        }
    }
}

/// Tuning for automatic tier selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub fps_thresholds: FpsThresholds,
    /// Evaluation cycles (FPS finalizations, not raw frames) required since
    /// the last transition before another one may happen
    pub stability_window_frames: u32,
    pub hysteresis_fps: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            fps_thresholds: FpsThresholds::default(),
            stability_window_frames: DEFAULT_STABILITY_WINDOW,
            hysteresis_fps: DEFAULT_HYSTERESIS_FPS,
        }
    }
}

/// Reasons a configuration is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("FPS thresholds must be strictly ascending (low {low} < medium {medium} < high {high} < ultra {ultra})")]
    UnorderedThresholds {
        low: f64,
        medium: f64,
        high: f64,
        ultra: f64,
    },
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidValue { field: &'static str, value: f64 },
    #[error("stability window must be at least one cycle")]
    EmptyStabilityWindow,
    #[error("target FPS must be positive")]
    ZeroTargetFps,
}

impl AdaptiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.fps_thresholds;
        for (field, value) in [
            ("fps_thresholds.low", t.low),
            ("fps_thresholds.medium", t.medium),
            ("fps_thresholds.high", t.high),
            ("fps_thresholds.ultra", t.ultra),
            ("hysteresis_fps", self.hysteresis_fps),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        if !(t.low < t.medium && t.medium < t.high && t.high < t.ultra) {
            return Err(ConfigError::UnorderedThresholds {
                low: t.low,
                medium: t.medium,
                high: t.high,
                ultra: t.ultra,
            });
        }
        if self.stability_window_frames == 0 {
            return Err(ConfigError::EmptyStabilityWindow);
        }
        Ok(())
    }

    /// Merge `update` onto a copy of `self` and validate the result.
    pub fn merged(&self, update: &AdaptiveConfigUpdate) -> Result<Self, ConfigError> {
        let mut next = *self;
        if let Some(t) = &update.fps_thresholds {
            next.fps_thresholds = FpsThresholds {
                low: t.low.unwrap_or(next.fps_thresholds.low),
                medium: t.medium.unwrap_or(next.fps_thresholds.medium),
                high: t.high.unwrap_or(next.fps_thresholds.high),
                ultra: t.ultra.unwrap_or(next.fps_thresholds.ultra),
            };
        }
        if let Some(window) = update.stability_window_frames {
            next.stability_window_frames = window;
        }
        if let Some(h) = update.hysteresis_fps {
            next.hysteresis_fps = h;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial threshold override; missing fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsUpdate {
    pub low: Option<f64>,
    pub medium: Option<f64>,
    pub high: Option<f64>,
    pub ultra: Option<f64>,
}

/// Partial [`AdaptiveConfig`] as accepted by `configure_adaptive_quality`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfigUpdate {
    pub fps_thresholds: Option<ThresholdsUpdate>,
    pub stability_window_frames: Option<u32>,
    pub hysteresis_fps: Option<f64>,
}

impl AdaptiveConfigUpdate {
    pub fn thresholds(low: f64, medium: f64, high: f64, ultra: f64) -> Self {
        Self {
            fps_thresholds: Some(ThresholdsUpdate {
                low: Some(low),
                medium: Some(medium),
                high: Some(high),
                ultra: Some(ultra),
            }),
            ..Default::default()
        }
    }
}

/// Startup settings read from `quality.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub target_fps: u32,
    pub quality: QualityPreference,
    pub adaptive: AdaptiveConfigUpdate,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            quality: QualityPreference::Auto,
            adaptive: AdaptiveConfigUpdate::default(),
        }
    }
}

impl QualitySettings {
    /// `<config dir>/alice-quality/quality.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("alice-quality").join("quality.json"))
    }

    /// Adaptive config these settings produce on top of the defaults
    pub fn adaptive_config(&self) -> Result<AdaptiveConfig, ConfigError> {
        AdaptiveConfig::default().merged(&self.adaptive)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::ZeroTargetFps);
        }
        self.adaptive_config().map(|_| ())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(text).context("Invalid quality settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from file (synchronous wrapper)
    pub fn load(path: &Path) -> Result<Self> {
        block_on_io(Self::load_async(path))
    }

    /// Load settings from file asynchronously
    pub async fn load_async(path: &Path) -> Result<Self> {
        tracing::info!("Loading quality settings: {:?}", path);
        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No quality settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub async fn save_async(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        block_on_io(self.save_async(path))
    }
}

/// Drive a tokio::fs future from synchronous code.
fn block_on_io<F, T>(future: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start I/O runtime")?
        .block_on(future)
}
