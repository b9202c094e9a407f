//! Quality HUD overlay
//!
//! Shows the controller's FPS history as a micro-graph, the current score,
//! grade and tier, the optimization tips, and lets the user pin a tier or
//! return to automatic mode. Tier changes are recorded through an
//! `on_quality_change` subscription.

use crate::metrics::Grade;
use crate::quality::{QualityController, QualityTier, SubscriptionToken};
use chrono::{DateTime, Local};
use egui::epaint::PathShape;
use egui::{Color32, Pos2, Stroke};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Transitions kept in the HUD log
const TRANSITION_LOG_LEN: usize = 8;
/// FPS mapped to the top of the graph
const GRAPH_MAX_FPS: f32 = 120.0;

/// A tier change as seen by the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEntry {
    pub at: DateTime<Local>,
    pub tier: QualityTier,
}

/// User input from the HUD, applied by the owner of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudAction {
    SetQuality(QualityTier),
    SetAdaptive(bool),
}

/// Quality overlay state
pub struct QualityHud {
    transitions: Arc<Mutex<VecDeque<TransitionEntry>>>,
    subscription: Option<SubscriptionToken>,
    /// Pre-allocated buffer for graph points
    graph_points_buffer: Vec<Pos2>,
}

impl QualityHud {
    pub fn new() -> Self {
        Self {
            transitions: Arc::new(Mutex::new(VecDeque::with_capacity(TRANSITION_LOG_LEN))),
            subscription: None,
            graph_points_buffer: Vec::with_capacity(crate::metrics::FPS_HISTORY_LEN),
        }
    }

    /// Start recording tier changes from `controller`
    pub fn attach(&mut self, controller: &mut QualityController) {
        if self.subscription.is_some() {
            return;
        }
        let log = self.transitions.clone();
        let token = controller.on_quality_change(move |tier| {
            let mut log = match log.lock() {
                Ok(log) => log,
                Err(poisoned) => poisoned.into_inner(),
            };
            if log.len() == TRANSITION_LOG_LEN {
                log.pop_front();
            }
            log.push_back(TransitionEntry {
                at: Local::now(),
                tier,
            });
        });
        self.subscription = Some(token);
    }

    /// Stop recording. Safe to call when not attached.
    pub fn detach(&mut self, controller: &mut QualityController) {
        if let Some(token) = self.subscription.take() {
            controller.unsubscribe(token);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Recorded transitions, oldest first
    pub fn transitions(&self) -> Vec<TransitionEntry> {
        match self.transitions.lock() {
            Ok(log) => log.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Draw the overlay; returns the user's requests in the order to apply them
    pub fn show(&mut self, ctx: &egui::Context, controller: &QualityController) -> Vec<HudAction> {
        let metrics = controller.metrics();
        let score = controller.performance_score();
        let grade = controller.performance_grade();
        let tips = controller.optimization_tips();
        let history = controller.fps_history();
        let transitions = self.transitions();

        let mut selected = metrics.quality_tier;
        let mut adaptive = controller.is_adaptive();
        let points = &mut self.graph_points_buffer;

        egui::Area::new(egui::Id::new("quality_overlay"))
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 40.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(Color32::from_rgba_premultiplied(10, 10, 10, 230))
                    .stroke(Stroke::new(1.0, Color32::from_gray(60)))
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.label(egui::RichText::new("QUALITY").strong().color(Color32::WHITE));
                        ui.add_space(4.0);

                        // FPS history graph
                        let graph_size = egui::vec2(200.0, 40.0);
                        let (rect, _) = ui.allocate_exact_size(graph_size, egui::Sense::hover());
                        ui.painter().rect_filled(rect, 2.0, Color32::from_black_alpha(100));

                        points.clear();
                        let len = history.len().max(2) as f32 - 1.0;
                        for (i, fps) in history.iter().enumerate() {
                            let x = rect.min.x + (i as f32 / len) * rect.width();
                            let h = (*fps as f32 / GRAPH_MAX_FPS).min(1.0);
                            points.push(Pos2::new(x, rect.max.y - h * rect.height()));
                        }
                        if points.len() >= 2 {
                            ui.painter().add(PathShape::line(
                                points.clone(),
                                Stroke::new(1.5, Color32::GREEN),
                            ));
                        }

                        // Target line
                        let target_h = (metrics.target_fps as f32 / GRAPH_MAX_FPS).min(1.0);
                        let target_y = rect.max.y - target_h * rect.height();
                        ui.painter().line_segment(
                            [Pos2::new(rect.min.x, target_y), Pos2::new(rect.max.x, target_y)],
                            Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 50)),
                        );

                        ui.add_space(4.0);

                        egui::Grid::new("quality_grid")
                            .num_columns(2)
                            .spacing([20.0, 4.0])
                            .show(ui, |ui| {
                                ui.label("FPS:");
                                ui.colored_label(fps_color(metrics.fps, metrics.target_fps), metrics.fps.to_string());
                                ui.end_row();

                                ui.label("Frame:");
                                ui.label(format!("{:.2} ms", metrics.frame_time_ms));
                                ui.end_row();

                                ui.label("Score:");
                                ui.colored_label(grade_color(grade), format!("{} ({})", score, grade));
                                ui.end_row();

                                ui.label("Triangles:");
                                ui.label(metrics.triangle_count.to_string());
                                ui.end_row();

                                ui.label("Draw calls:");
                                ui.label(metrics.draw_calls.to_string());
                                ui.end_row();

                                ui.label("Tier:");
                                egui::ComboBox::from_id_source("hud_quality_tier")
                                    .selected_text(selected.name())
                                    .show_ui(ui, |ui| {
                                        for tier in QualityTier::ALL {
                                            ui.selectable_value(&mut selected, tier, tier.name());
                                        }
                                    });
                                ui.end_row();
                            });

                        ui.checkbox(&mut adaptive, "Auto");

                        for tip in &tips {
                            ui.colored_label(Color32::YELLOW, tip);
                        }

                        if let Some(last) = transitions.last() {
                            ui.label(format!("Last change: {} at {}", last.tier, last.at.format("%H:%M:%S")));
                        }
                    });
            });

        hud_actions(metrics.quality_tier, selected, controller.is_adaptive(), adaptive)
    }
}

/// Actions for the widget changes made this frame. The tier goes first since
/// pinning a tier pauses adaptive mode; a checkbox change is applied after it.
fn hud_actions(
    current: QualityTier,
    selected: QualityTier,
    was_adaptive: bool,
    adaptive: bool,
) -> Vec<HudAction> {
    let mut actions = Vec::new();
    if selected != current {
        actions.push(HudAction::SetQuality(selected));
    }
    if adaptive != was_adaptive {
        actions.push(HudAction::SetAdaptive(adaptive));
    }
    actions
}

impl Default for QualityHud {
    fn default() -> Self {
        Self::new()
    }
}

fn fps_color(fps: u32, target: u32) -> Color32 {
    let ratio = fps as f32 / target.max(1) as f32;
    if ratio >= 0.9 {
        Color32::GREEN
    } else if ratio >= 0.5 {
        Color32::YELLOW
    } else {
        Color32::RED
    }
}

fn grade_color(grade: Grade) -> Color32 {
    match grade {
        Grade::A | Grade::B => Color32::GREEN,
        Grade::C | Grade::D => Color32::YELLOW,
        Grade::F => Color32::RED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_records_transitions() {
        let mut controller = QualityController::default();
        let mut hud = QualityHud::new();
        hud.attach(&mut controller);
        hud.attach(&mut controller);

        controller.set_quality(QualityTier::Low);
        controller.set_quality(QualityTier::Medium);

        let tiers: Vec<_> = hud.transitions().iter().map(|t| t.tier).collect();
        assert_eq!(tiers, vec![QualityTier::Low, QualityTier::Medium]);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut controller = QualityController::default();
        let mut hud = QualityHud::new();
        hud.attach(&mut controller);
        hud.detach(&mut controller);
        hud.detach(&mut controller);
        assert!(!hud.is_attached());

        controller.set_quality(QualityTier::Ultra);
        assert!(hud.transitions().is_empty());
    }

    #[test]
    fn test_log_is_bounded() {
        let mut controller = QualityController::default();
        let mut hud = QualityHud::new();
        hud.attach(&mut controller);
        for i in 0..20 {
            controller.set_quality(QualityTier::ALL[i % 4]);
        }
        assert_eq!(hud.transitions().len(), TRANSITION_LOG_LEN);
    }

    #[test]
    fn test_show_without_input_requests_nothing() {
        let mut controller = QualityController::default();
        for fps in [58, 61, 60, 59] {
            controller.ingest_fps_sample(fps);
        }
        let mut hud = QualityHud::new();
        let ctx = egui::Context::default();

        let mut actions = Vec::new();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            actions = hud.show(ctx, &controller);
        });
        assert!(actions.is_empty());
    }

    #[test]
    fn test_tier_and_auto_changed_together() {
        let actions = hud_actions(QualityTier::High, QualityTier::Low, false, true);
        assert_eq!(
            actions,
            vec![HudAction::SetQuality(QualityTier::Low), HudAction::SetAdaptive(true)]
        );

        let mut controller = QualityController::default();
        controller.set_adaptive_mode(false);
        for action in actions {
            match action {
                HudAction::SetQuality(tier) => controller.set_quality(tier),
                HudAction::SetAdaptive(enabled) => controller.set_adaptive_mode(enabled),
            }
        }
        assert_eq!(controller.quality(), QualityTier::Low);
        assert!(controller.is_adaptive());

        assert_eq!(
            hud_actions(QualityTier::High, QualityTier::High, true, false),
            vec![HudAction::SetAdaptive(false)]
        );
        assert!(hud_actions(QualityTier::Ultra, QualityTier::Ultra, true, true).is_empty());
    }

    #[test]
    fn test_fps_color_bands() {
        assert_eq!(fps_color(60, 60), Color32::GREEN);
        assert_eq!(fps_color(40, 60), Color32::YELLOW);
        assert_eq!(fps_color(10, 60), Color32::RED);
    }
}
