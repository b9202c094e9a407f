//! ALICE-Quality: adaptive rendering quality for real-time 3D scenes
//!
//! Watches frame rate, grades performance, and steps the rendering tier
//! (Low / Medium / High / Ultra) up or down with hysteresis and a stability
//! window so the scene never flickers between tiers. Renderer components
//! subscribe to tier changes and pull the matching [`QualityProfile`];
//! per-object geometry detail comes from [`select_lod`].
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use alice_quality::{QualityController, QualityTier};
//!
//! let mut controller = QualityController::new(60);
//! controller.on_quality_change(|tier| {
//!     println!("now rendering at {}", tier);
//! });
//!
//! // Call once per rendered frame with a monotonic clock in milliseconds
//! controller.on_frame(16.6);
//!
//! // Or pin a tier manually
//! controller.set_quality(QualityTier::Medium);
//! let profile = controller.current_profile();
//! assert_eq!(profile.shadow_map_size, 1024);
//! ```

pub mod app;
pub mod metrics;
pub mod quality;
pub mod renderer;
pub mod ui;

// Re-export key types
pub use app::{QualityApp, ViewerConfig};
pub use metrics::{
    optimization_tips, performance_grade, performance_score, Grade, MetricsSampler,
    MetricsSnapshot, RendererStats, RendererStatsProvider, SharedRendererStats,
};
pub use quality::{
    resolve_profile, AdaptiveConfig, AdaptiveConfigUpdate, ConfigError, QualityController,
    QualityPreference, QualityProfile, QualityProfileResolver, QualitySettings, QualityTier,
    SubscriptionToken,
};
pub use renderer::{select_lod, LodSelection, LodSelector, LodVariant, RenderSettings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
