//! User interface module using egui
//!
//! Diagnostic overlay for the quality controller.

mod stats;

pub use stats::*;

use crate::quality::QualityController;

/// UI state and rendering
pub struct Ui {
    /// Quality overlay open state
    hud_open: bool,
    hud: QualityHud,
}

impl Ui {
    pub fn new(hud_open: bool) -> Self {
        Self {
            hud_open,
            hud: QualityHud::new(),
        }
    }

    pub fn toggle_hud(&mut self) {
        self.hud_open = !self.hud_open;
    }

    pub fn hud_open(&self) -> bool {
        self.hud_open
    }

    pub fn hud(&self) -> &QualityHud {
        &self.hud
    }

    pub fn hud_mut(&mut self) -> &mut QualityHud {
        &mut self.hud
    }

    /// Draw the UI for this frame; returns the HUD requests, if any
    pub fn show(&mut self, ctx: &egui::Context, controller: &QualityController) -> Vec<HudAction> {
        if !self.hud_open {
            return Vec::new();
        }
        self.hud.show(ctx, controller)
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new(false)
    }
}
