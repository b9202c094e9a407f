//! Renderer-side consumers of the quality controller
//!
//! The renderer never measures anything itself: it applies the profile of
//! the active tier and picks mesh LODs per object.

mod lod;

pub use lod::*;

use crate::quality::{QualityProfile, QualityTier};

/// Settings a renderer configures its passes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub tier: QualityTier,
    pub profile: QualityProfile,
    /// Device pixel ratio after the profile cap
    pub pixel_ratio: f32,
    /// Set whenever the settings changed; cleared by the renderer once applied
    pub dirty: bool,
}

impl RenderSettings {
    pub fn new(tier: QualityTier, profile: QualityProfile, device_pixel_ratio: f32) -> Self {
        Self {
            tier,
            profile,
            pixel_ratio: profile.effective_pixel_ratio(device_pixel_ratio),
            dirty: true,
        }
    }

    /// Switch to a new tier's profile, keeping the display's pixel ratio
    pub fn apply(&mut self, tier: QualityTier, profile: QualityProfile, device_pixel_ratio: f32) {
        let next = Self::new(tier, profile, device_pixel_ratio);
        if next.tier != self.tier || next.profile != self.profile || next.pixel_ratio != self.pixel_ratio {
            tracing::info!(
                %tier,
                pixel_ratio = next.pixel_ratio,
                shadow_map = profile.shadow_map_size,
                "Render settings updated"
            );
            *self = next;
        }
    }

    /// LOD selector for a mesh, with breakpoints tightened by the active profile
    pub fn lod_selector(&self, triangle_count: u64) -> LodSelector {
        LodSelector::with_mesh_detail(triangle_count, self.profile.mesh_detail)
    }

    /// Whether an object drawn at `variant` should be in the shadow pass
    pub fn shadows_enabled_for(&self, variant: LodVariant) -> bool {
        self.profile.shadow_map_size > 0 && variant.casts_shadows()
    }

    pub fn mark_applied(&mut self) {
        self.dirty = false;
    }
}
