//! Distance-based mesh LOD selection
//!
//! Every renderable carries three precomputed geometry variants (full,
//! reduced, minimal). Breakpoints are derived once from the full-detail
//! triangle count: expensive meshes step down sooner.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Above this many triangles a mesh uses the tight breakpoints
pub const HEAVY_MESH_TRIANGLES: u64 = 10_000;
/// Breakpoints for meshes above [`HEAVY_MESH_TRIANGLES`]
pub const HEAVY_BREAKPOINTS: [f32; 3] = [0.0, 10.0, 25.0];
/// Breakpoints for everything else
pub const LIGHT_BREAKPOINTS: [f32; 3] = [0.0, 15.0, 35.0];

/// Geometry variant, ordered from most to least detailed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LodVariant {
    Full,
    Reduced,
    Minimal,
}

impl LodVariant {
    pub const ALL: [LodVariant; 3] = [Self::Full, Self::Reduced, Self::Minimal];

    pub const fn index(self) -> usize {
        match self {
            Self::Full => 0,
            Self::Reduced => 1,
            Self::Minimal => 2,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Full,
            1 => Self::Reduced,
            _ => Self::Minimal,
        }
    }

    /// Fraction of the full triangle count this variant keeps
    pub fn triangle_ratio(self) -> f32 {
        match self {
            Self::Full => 1.0,
            Self::Reduced => 0.66,
            Self::Minimal => 0.33,
        }
    }

    /// Triangle budget for this variant of a mesh with `full` triangles
    pub fn triangle_budget(self, full: u64) -> u64 {
        (full as f64 * self.triangle_ratio() as f64).round() as u64
    }

    /// Only the full-detail variant takes part in shadowing
    pub fn casts_shadows(self) -> bool {
        self == Self::Full
    }

    pub fn receives_shadows(self) -> bool {
        self == Self::Full
    }
}

/// Ascending camera distances at which each variant starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodBreakpoints(pub [f32; 3]);

impl LodBreakpoints {
    pub fn for_triangle_count(triangle_count: u64) -> Self {
        if triangle_count > HEAVY_MESH_TRIANGLES {
            Self(HEAVY_BREAKPOINTS)
        } else {
            Self(LIGHT_BREAKPOINTS)
        }
    }

    /// Scale by a profile's mesh-detail multiplier (below 1.0 steps down sooner)
    pub fn scaled(&self, multiplier: f32) -> Self {
        let m = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        Self(self.0.map(|b| b * m))
    }

    /// Highest-indexed variant whose breakpoint is <= `distance`
    pub fn variant_at(&self, distance: f32) -> LodVariant {
        let d = if distance.is_finite() {
            distance.max(0.0)
        } else if distance > 0.0 {
            f32::MAX
        } else {
            // NaN or -inf
            0.0
        };
        let index = self.0.iter().rposition(|&b| d >= b).unwrap_or(0);
        LodVariant::from_index(index)
    }
}

/// Result of a LOD query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodSelection {
    pub variant: LodVariant,
    pub breakpoints: LodBreakpoints,
}

impl LodSelection {
    pub fn variant_index(&self) -> usize {
        self.variant.index()
    }
}

/// Per-object selector; breakpoints are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodSelector {
    triangle_count: u64,
    breakpoints: LodBreakpoints,
}

impl LodSelector {
    pub fn new(triangle_count: u64) -> Self {
        Self {
            triangle_count,
            breakpoints: LodBreakpoints::for_triangle_count(triangle_count),
        }
    }

    /// Selector whose breakpoints are scaled by `mesh_detail`
    pub fn with_mesh_detail(triangle_count: u64, mesh_detail: f32) -> Self {
        Self {
            triangle_count,
            breakpoints: LodBreakpoints::for_triangle_count(triangle_count).scaled(mesh_detail),
        }
    }

    pub fn select(&self, camera_distance: f32) -> LodSelection {
        LodSelection {
            variant: self.breakpoints.variant_at(camera_distance),
            breakpoints: self.breakpoints,
        }
    }

    /// Select from world positions
    pub fn select_between(&self, camera: Vec3, object: Vec3) -> LodSelection {
        self.select(camera.distance(object))
    }

    pub fn breakpoints(&self) -> LodBreakpoints {
        self.breakpoints
    }

    /// Triangles submitted for `variant` of this object
    pub fn triangle_budget(&self, variant: LodVariant) -> u64 {
        variant.triangle_budget(self.triangle_count)
    }
}

/// One-shot LOD query
pub fn select_lod(triangle_count: u64, camera_distance: f32) -> LodSelection {
    LodSelector::new(triangle_count).select(camera_distance)
}
