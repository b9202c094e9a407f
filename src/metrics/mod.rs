//! Frame metrics collection and scoring
//!
//! - Ring-buffer frame-time smoothing (no per-frame allocation)
//! - Renderer counters pulled through an injected provider
//! - Pull-based score / grade / tips

mod sampler;
mod score;

pub use sampler::*;
pub use score::*;

use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Read-only copy of the controller's current measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub fps: u32,
    pub frame_time_ms: f64,
    pub triangle_count: u64,
    pub draw_calls: u64,
    pub texture_count: u64,
    pub geometry_count: u64,
    pub material_count: u64,
    pub memory_mb: f64,
    pub target_fps: u32,
    pub quality_tier: QualityTier,
}

/// Counters published by the renderer once per finalized metrics cycle.
///
/// A `None` field means "not reported this cycle"; the sampler keeps the
/// last value it saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererStats {
    pub triangles: Option<u64>,
    pub draw_calls: Option<u64>,
    pub textures: Option<u64>,
    pub geometries: Option<u64>,
    pub materials: Option<u64>,
    pub memory_mb: Option<f64>,
}

/// Last-known renderer counters, zero until first reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RendererCounters {
    pub triangles: u64,
    pub draw_calls: u64,
    pub textures: u64,
    pub geometries: u64,
    pub materials: u64,
    pub memory_mb: f64,
}

impl RendererCounters {
    /// Overwrite the fields present in `stats`
    pub fn merge(&mut self, stats: &RendererStats) {
        if let Some(v) = stats.triangles {
            self.triangles = v;
        }
        if let Some(v) = stats.draw_calls {
            self.draw_calls = v;
        }
        if let Some(v) = stats.textures {
            self.textures = v;
        }
        if let Some(v) = stats.geometries {
            self.geometries = v;
        }
        if let Some(v) = stats.materials {
            self.materials = v;
        }
        if let Some(v) = stats.memory_mb.filter(|mb| mb.is_finite() && *mb >= 0.0) {
            self.memory_mb = v;
        }
    }
}

/// Pull accessor for renderer statistics, injected into the sampler.
pub trait RendererStatsProvider: Send {
    /// Current counters; return `RendererStats::default()` when nothing is
    /// available yet. Must not block.
    fn renderer_stats(&self) -> RendererStats;
}

/// Provider used when no renderer feed is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRendererStats;

impl RendererStatsProvider for NoRendererStats {
    fn renderer_stats(&self) -> RendererStats {
        RendererStats::default()
    }
}

/// Shared slot the renderer publishes into and the sampler reads from.
///
/// Clones share the same slot, so the renderer side and the controller side
/// can live on different threads.
#[derive(Debug, Clone, Default)]
pub struct SharedRendererStats {
    slot: Arc<Mutex<RendererStats>>,
}

impl SharedRendererStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published counters
    pub fn publish(&self, stats: RendererStats) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = stats,
            Err(poisoned) => *poisoned.into_inner() = stats,
        }
    }
}

impl RendererStatsProvider for SharedRendererStats {
    fn renderer_stats(&self) -> RendererStats {
        match self.slot.try_lock() {
            Ok(slot) => *slot,
            // Publisher holds the lock right now; caller keeps last-known values
            Err(_) => RendererStats::default(),
        }
    }
}
