//! Viewer-side composition root for adaptive quality (winit 0.29 key codes)

use crate::metrics::SharedRendererStats;
use crate::quality::{
    AdaptiveConfigUpdate, QualityController, QualitySettings, QualityTier, SubscriptionToken,
    ThresholdsUpdate,
};
use crate::renderer::{LodSelection, RenderSettings};
use crate::ui::{HudAction, Ui};
use anyhow::Result;
use glam::Vec3;
use std::sync::{Arc, Mutex};
use winit::keyboard::KeyCode;

/// Configuration for embedding the quality loop in a viewer
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Show the quality overlay on startup
    pub show_hud: bool,
    /// Display scale factor reported by the window
    pub device_pixel_ratio: f32,
    pub quality: QualitySettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            show_hud: false,
            device_pixel_ratio: 1.0,
            quality: QualitySettings::default(),
        }
    }
}

/// Owns the controller for one viewer session and wires its consumers.
pub struct QualityApp {
    controller: QualityController,
    renderer_stats: SharedRendererStats,
    render_settings: RenderSettings,
    /// Tier published by the controller, not yet pulled into `render_settings`
    pending_tier: Arc<Mutex<Option<QualityTier>>>,
    render_subscription: SubscriptionToken,
    ui: Ui,
    device_pixel_ratio: f32,
}

impl QualityApp {
    pub fn with_config(config: ViewerConfig) -> Result<Self> {
        config.quality.validate()?;

        let renderer_stats = SharedRendererStats::new();
        let mut controller =
            QualityController::with_provider(Box::new(renderer_stats.clone()), config.quality.target_fps);
        controller.configure_adaptive_quality(config.quality.adaptive)?;
        controller.apply_preference(config.quality.quality);

        let pending_tier = Arc::new(Mutex::new(None));
        let render_subscription = {
            let pending = pending_tier.clone();
            controller.on_quality_change(move |tier| {
                if let Ok(mut slot) = pending.lock() {
                    *slot = Some(tier);
                }
            })
        };

        let tier = controller.quality();
        let render_settings =
            RenderSettings::new(tier, controller.resolve_profile(tier), config.device_pixel_ratio);

        let mut ui = Ui::new(config.show_hud);
        ui.hud_mut().attach(&mut controller);

        tracing::info!(
            %tier,
            adaptive = controller.is_adaptive(),
            target_fps = config.quality.target_fps,
            "Quality loop initialized"
        );

        Ok(Self {
            controller,
            renderer_stats,
            render_settings,
            pending_tier,
            render_subscription,
            ui,
            device_pixel_ratio: config.device_pixel_ratio,
        })
    }

    /// Handle the renderer publishes its counters into
    pub fn renderer_stats(&self) -> SharedRendererStats {
        self.renderer_stats.clone()
    }

    pub fn controller(&self) -> &QualityController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut QualityController {
        &mut self.controller
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render_settings
    }

    pub fn render_settings_mut(&mut self) -> &mut RenderSettings {
        &mut self.render_settings
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    /// Per-frame hook, called on every redraw
    pub fn on_redraw(&mut self, now_ms: f64) {
        self.controller.on_frame(now_ms);
        self.sync_render_settings();
    }

    /// Feed an FPS sample measured by the host instead of frame timestamps
    pub fn ingest_fps_sample(&mut self, fps: u32) {
        self.controller.ingest_fps_sample(fps);
        self.sync_render_settings();
    }

    /// Pull the profile for a tier change announced since the last frame
    fn sync_render_settings(&mut self) {
        let pending = match self.pending_tier.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(tier) = pending {
            let profile = self.controller.resolve_profile(tier);
            self.render_settings.apply(tier, profile, self.device_pixel_ratio);
        }
    }

    /// Window scale factor changed
    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.device_pixel_ratio = ratio;
        let tier = self.render_settings.tier;
        self.render_settings.apply(tier, self.controller.resolve_profile(tier), ratio);
    }

    /// LOD for an object, using the active profile's mesh detail
    pub fn select_lod(&self, triangle_count: u64, camera: Vec3, object: Vec3) -> LodSelection {
        self.render_settings
            .lod_selector(triangle_count)
            .select_between(camera, object)
    }

    /// Draw the UI and apply whatever the user chose
    pub fn draw_ui(&mut self, ctx: &egui::Context) {
        for action in self.ui.show(ctx, &self.controller) {
            self.apply_action(action);
        }
    }

    pub fn apply_action(&mut self, action: HudAction) {
        match action {
            HudAction::SetQuality(tier) => self.controller.set_quality(tier),
            HudAction::SetAdaptive(enabled) => self.controller.set_adaptive_mode(enabled),
        }
        self.sync_render_settings();
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }

        tracing::debug!("Key pressed: {:?}", key);

        match key {
            KeyCode::F2 => {
                self.ui.toggle_hud();
                tracing::info!("Quality HUD: {}", self.ui.hud_open());
            }
            KeyCode::F5 => {
                let next = self.controller.quality().cycle();
                self.apply_action(HudAction::SetQuality(next));
            }
            KeyCode::F6 => {
                let enabled = !self.controller.is_adaptive();
                self.apply_action(HudAction::SetAdaptive(enabled));
            }
            _ => {}
        }
    }

    /// Current state in the shape of a settings file
    pub fn settings(&self) -> QualitySettings {
        let config = self.controller.config();
        let t = &config.fps_thresholds;
        QualitySettings {
            target_fps: self.controller.metrics().target_fps,
            quality: self.controller.preference(),
            adaptive: AdaptiveConfigUpdate {
                fps_thresholds: Some(ThresholdsUpdate {
                    low: Some(t.low),
                    medium: Some(t.medium),
                    high: Some(t.high),
                    ultra: Some(t.ultra),
                }),
                stability_window_frames: Some(config.stability_window_frames),
                hysteresis_fps: Some(config.hysteresis_fps),
            },
        }
    }

    /// Tear down subscriptions before the viewer goes away
    pub fn shutdown(&mut self) {
        self.controller.unsubscribe(self.render_subscription);
        self.ui.hud_mut().detach(&mut self.controller);
    }
}
