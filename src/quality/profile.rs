//! Static tier -> rendering parameter table

use super::QualityTier;
use serde::{Deserialize, Serialize};

/// Concrete rendering settings for one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Upper bound applied to the device pixel ratio
    pub pixel_ratio_cap: f32,
    /// Shadow map edge length in texels
    pub shadow_map_size: u32,
    /// Bloom render target edge length
    pub bloom_resolution: u32,
    /// Environment map (cubemap face) edge length
    pub env_map_resolution: u32,
    /// Maximum simultaneous dynamic lights
    pub max_lights: u32,
    /// Scales LOD distance breakpoints; below 1.0 drops detail sooner
    pub mesh_detail: f32,
    /// Base texture edge length
    pub texture_resolution: u32,
    /// Anisotropic filtering level (1 = off)
    pub anisotropy: u8,
    pub antialias: bool,
}

impl QualityProfile {
    /// Pixel ratio to render at on a display with `device_ratio`
    pub fn effective_pixel_ratio(&self, device_ratio: f32) -> f32 {
        if !device_ratio.is_finite() || device_ratio <= 0.0 {
            return 1.0_f32.min(self.pixel_ratio_cap);
        }
        device_ratio.min(self.pixel_ratio_cap)
    }
}

/// Built-in profiles, indexed by [`QualityTier::index`]
pub const DEFAULT_PROFILES: [QualityProfile; 4] = [
    // Low
    QualityProfile {
        pixel_ratio_cap: 1.0,
        shadow_map_size: 512,
        bloom_resolution: 256,
        env_map_resolution: 128,
        max_lights: 2,
        mesh_detail: 0.5,
        texture_resolution: 512,
        anisotropy: 1,
        antialias: false,
    },
    // Medium
    QualityProfile {
        pixel_ratio_cap: 1.5,
        shadow_map_size: 1024,
        bloom_resolution: 512,
        env_map_resolution: 256,
        max_lights: 4,
        mesh_detail: 0.75,
        texture_resolution: 1024,
        anisotropy: 4,
        antialias: true,
    },
    // High
    QualityProfile {
        pixel_ratio_cap: 2.0,
        shadow_map_size: 2048,
        bloom_resolution: 1024,
        env_map_resolution: 512,
        max_lights: 8,
        mesh_detail: 1.0,
        texture_resolution: 2048,
        anisotropy: 8,
        antialias: true,
    },
    // Ultra
    QualityProfile {
        pixel_ratio_cap: 3.0,
        shadow_map_size: 4096,
        bloom_resolution: 2048,
        env_map_resolution: 1024,
        max_lights: 16,
        mesh_detail: 1.25,
        texture_resolution: 4096,
        anisotropy: 16,
        antialias: true,
    },
];

/// Look up the built-in profile for `tier`. Pure, safe to call every frame.
pub fn resolve_profile(tier: QualityTier) -> QualityProfile {
    DEFAULT_PROFILES[tier.index()]
}

/// Profile table that can be reconfigured by swapping whole rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityProfileResolver {
    table: [QualityProfile; 4],
}

impl QualityProfileResolver {
    pub fn new() -> Self {
        Self {
            table: DEFAULT_PROFILES,
        }
    }

    /// Replace the row for `tier` with `profile`
    pub fn with_profile(mut self, tier: QualityTier, profile: QualityProfile) -> Self {
        self.table[tier.index()] = profile;
        self
    }

    pub fn resolve(&self, tier: QualityTier) -> QualityProfile {
        self.table[tier.index()]
    }
}

impl Default for QualityProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_scale_with_tier() {
        for pair in QualityTier::ALL.windows(2) {
            let lo = resolve_profile(pair[0]);
            let hi = resolve_profile(pair[1]);
            assert!(lo.shadow_map_size < hi.shadow_map_size);
            assert!(lo.max_lights < hi.max_lights);
            assert!(lo.mesh_detail < hi.mesh_detail);
            assert!(lo.texture_resolution < hi.texture_resolution);
        }
        assert!(!resolve_profile(QualityTier::Low).antialias);
        assert!(resolve_profile(QualityTier::Ultra).antialias);
    }

    #[test]
    fn test_effective_pixel_ratio_caps() {
        let low = resolve_profile(QualityTier::Low);
        assert_eq!(low.effective_pixel_ratio(2.0), 1.0);
        let high = resolve_profile(QualityTier::High);
        assert_eq!(high.effective_pixel_ratio(1.25), 1.25);
        assert_eq!(high.effective_pixel_ratio(f32::NAN), 1.0);
    }

    #[test]
    fn test_resolver_substitutes_row() {
        let custom = QualityProfile {
            shadow_map_size: 256,
            ..resolve_profile(QualityTier::Low)
        };
        let resolver = QualityProfileResolver::new().with_profile(QualityTier::Low, custom);
        assert_eq!(resolver.resolve(QualityTier::Low).shadow_map_size, 256);
        assert_eq!(resolver.resolve(QualityTier::High), resolve_profile(QualityTier::High));
    }
}
