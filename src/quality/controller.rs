//! Adaptive quality controller
//!
//! # State Machine
//!
//! ```text
//!            avg <= low-h        avg <= medium-h       avg <= high-h
//!   any ---------------> Low, ---------------> Medium, -------------> High
//!   any --------------------------------------------------------------> Ultra
//!                                avg >= ultra+h
//! ```
//!
//! Evaluation happens once per finalized FPS sample while adaptive mode is
//! on. A transition needs `stability_window_frames` evaluation cycles since
//! the previous one; the counter resets on every transition, manual or
//! automatic. Values between the adjusted thresholds leave the tier alone.

use super::{
    AdaptiveConfig, AdaptiveConfigUpdate, ConfigError, QualityPreference, QualityProfile,
    QualityProfileResolver, QualityTier, SubscriptionHub, SubscriptionToken,
};
use crate::metrics::{
    self, Grade, MetricsSampler, MetricsSnapshot, NoRendererStats, RendererStatsProvider,
};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Cloneable handle for requesting a tier from inside a subscriber callback.
///
/// Requests are applied as manual transitions at the start of the next
/// evaluation, never from within the notification that issued them.
#[derive(Debug, Clone)]
pub struct QualityRequests {
    tx: Sender<QualityTier>,
}

impl QualityRequests {
    pub fn request(&self, tier: QualityTier) {
        // Receiver only goes away with the controller
        let _ = self.tx.send(tier);
    }
}

/// Owns the current tier, the FPS history and the subscriber registry.
pub struct QualityController {
    tier: QualityTier,
    adaptive_mode: bool,
    stability_counter: u32,
    config: AdaptiveConfig,
    target_fps: u32,
    sampler: MetricsSampler,
    profiles: QualityProfileResolver,
    subscribers: SubscriptionHub,
    requests_tx: Sender<QualityTier>,
    requests_rx: Receiver<QualityTier>,
}

impl QualityController {
    /// Controller in adaptive mode at `High`, with no renderer feed
    pub fn new(target_fps: u32) -> Self {
        Self::with_provider(Box::new(NoRendererStats), target_fps)
    }

    pub fn with_provider(provider: Box<dyn RendererStatsProvider>, target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        let (requests_tx, requests_rx) = channel();
        Self {
            tier: QualityTier::High,
            adaptive_mode: true,
            stability_counter: 0,
            config: AdaptiveConfig::default(),
            target_fps,
            sampler: MetricsSampler::new(provider, target_fps),
            profiles: QualityProfileResolver::default(),
            subscribers: SubscriptionHub::new(),
            requests_tx,
            requests_rx,
        }
    }

    /// Replace the profile table (defaults reconfigured wholesale)
    pub fn set_profiles(&mut self, profiles: QualityProfileResolver) {
        self.profiles = profiles;
    }

    /// Per-frame render-loop hook. `now_ms` is a monotonic clock reading.
    pub fn on_frame(&mut self, now_ms: f64) {
        self.drain_requests();
        if self.sampler.record_frame(now_ms).is_some() {
            self.evaluate();
        }
    }

    /// Per-frame hook using the sampler's own clock
    pub fn tick(&mut self) {
        self.drain_requests();
        if self.sampler.tick().is_some() {
            self.evaluate();
        }
    }

    /// Feed one finalized FPS sample (for hosts that measure FPS themselves)
    pub fn ingest_fps_sample(&mut self, fps: u32) {
        self.drain_requests();
        self.sampler.push_fps(fps);
        self.evaluate();
    }

    /// Apply requests queued before this call. Requests issued by subscribers
    /// while these are applied wait for the next call.
    fn drain_requests(&mut self) {
        let pending: Vec<QualityTier> = self.requests_rx.try_iter().collect();
        for tier in pending {
            tracing::debug!(%tier, "Applying queued quality request");
            self.set_quality(tier);
        }
    }

    fn evaluate(&mut self) {
        if !self.adaptive_mode {
            return;
        }
        let Some(avg_fps) = self.sampler.average_fps() else {
            return;
        };

        self.stability_counter = self.stability_counter.saturating_add(1);
        if self.stability_counter < self.config.stability_window_frames {
            return;
        }

        let candidate = self.candidate_tier(avg_fps);
        if candidate != self.tier {
            tracing::info!(
                from = %self.tier,
                to = %candidate,
                avg_fps,
                "Adaptive quality transition"
            );
            self.commit(candidate);
        }
    }

    /// Tier the thresholds point at for `avg_fps`, or the current tier in the dead zone
    fn candidate_tier(&self, avg_fps: f64) -> QualityTier {
        let t = &self.config.fps_thresholds;
        let h = self.config.hysteresis_fps;

        if avg_fps <= t.low - h {
            QualityTier::Low
        } else if avg_fps <= t.medium - h {
            QualityTier::Medium
        } else if avg_fps <= t.high - h {
            QualityTier::High
        } else if avg_fps >= t.ultra + h {
            QualityTier::Ultra
        } else {
            self.tier
        }
    }

    fn commit(&mut self, tier: QualityTier) {
        self.tier = tier;
        self.stability_counter = 0;
        self.subscribers.notify(tier);
    }

    /// Set the tier immediately, pausing adaptive mode until re-enabled
    pub fn set_quality(&mut self, tier: QualityTier) {
        if self.adaptive_mode {
            tracing::info!(%tier, "Manual quality override; adaptive mode paused");
        } else {
            tracing::info!(%tier, "Manual quality change");
        }
        self.adaptive_mode = false;
        self.commit(tier);
    }

    /// Enable or disable automatic tier selection.
    ///
    /// Enabling re-arms evaluation without changing the tier. Disabling
    /// keeps the current concrete tier.
    pub fn set_adaptive_mode(&mut self, enabled: bool) {
        if self.adaptive_mode != enabled {
            tracing::info!(enabled, tier = %self.tier, "Adaptive quality mode changed");
        }
        self.adaptive_mode = enabled;
    }

    /// Apply a user preference: `Auto` enables adaptive mode, a tier pins it
    pub fn apply_preference(&mut self, preference: QualityPreference) {
        match preference.tier() {
            Some(tier) => self.set_quality(tier),
            None => self.set_adaptive_mode(true),
        }
    }

    /// Merge a partial config. On error the previous config stays active.
    pub fn configure_adaptive_quality(
        &mut self,
        update: AdaptiveConfigUpdate,
    ) -> Result<(), ConfigError> {
        match self.config.merged(&update) {
            Ok(config) => {
                tracing::info!(?config, "Adaptive quality reconfigured");
                self.config = config;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rejected adaptive quality config: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_quality_change<F>(&mut self, callback: F) -> SubscriptionToken
    where
        F: FnMut(QualityTier) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.subscribers.unsubscribe(token)
    }

    pub fn requests(&self) -> QualityRequests {
        QualityRequests {
            tx: self.requests_tx.clone(),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let counters = self.sampler.counters();
        MetricsSnapshot {
            fps: self.sampler.fps(),
            frame_time_ms: self.sampler.frame_time_ms(),
            triangle_count: counters.triangles,
            draw_calls: counters.draw_calls,
            texture_count: counters.textures,
            geometry_count: counters.geometries,
            material_count: counters.materials,
            memory_mb: counters.memory_mb,
            target_fps: self.target_fps,
            quality_tier: self.tier,
        }
    }

    pub fn performance_score(&self) -> u32 {
        metrics::performance_score(&self.metrics())
    }

    pub fn performance_grade(&self) -> Grade {
        metrics::performance_grade(&self.metrics())
    }

    pub fn optimization_tips(&self) -> Vec<String> {
        metrics::optimization_tips(&self.metrics())
    }

    pub fn resolve_profile(&self, tier: QualityTier) -> QualityProfile {
        self.profiles.resolve(tier)
    }

    /// Profile of the tier currently in effect
    pub fn current_profile(&self) -> QualityProfile {
        self.profiles.resolve(self.tier)
    }

    pub fn quality(&self) -> QualityTier {
        self.tier
    }

    /// The setting a settings file would persist for the current state
    pub fn preference(&self) -> QualityPreference {
        if self.adaptive_mode {
            QualityPreference::Auto
        } else {
            self.tier.into()
        }
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive_mode
    }

    pub fn stability_counter(&self) -> u32 {
        self.stability_counter
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn average_fps(&self) -> Option<f64> {
        self.sampler.average_fps()
    }

    pub fn fps_history(&self) -> Vec<u32> {
        self.sampler.fps_history().collect()
    }
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(super::DEFAULT_TARGET_FPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{RendererStats, SharedRendererStats};
    use std::sync::{Arc, Mutex};

    fn transitions(controller: &mut QualityController) -> Arc<Mutex<Vec<QualityTier>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        controller.on_quality_change(move |tier| sink.lock().unwrap().push(tier));
        log
    }

    #[test]
    fn test_low_fps_drops_to_low_on_window_boundary() {
        let mut c = QualityController::new(60);
        let log = transitions(&mut c);

        for cycle in 1..=60 {
            c.ingest_fps_sample(25);
            if cycle < 60 {
                assert_eq!(c.quality(), QualityTier::High, "changed early at cycle {cycle}");
                assert_eq!(c.stability_counter(), cycle);
            }
        }

        assert_eq!(c.quality(), QualityTier::Low);
        assert_eq!(c.stability_counter(), 0);
        assert_eq!(*log.lock().unwrap(), vec![QualityTier::Low]);
    }

    #[test]
    fn test_dead_zone_below_ultra() {
        let mut c = QualityController::new(60);
        let log = transitions(&mut c);

        for _ in 0..60 {
            c.ingest_fps_sample(62);
        }
        assert_eq!(c.quality(), QualityTier::High);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(c.stability_counter(), 60);
    }

    #[test]
    fn test_high_fps_reaches_ultra() {
        let mut c = QualityController::new(60);
        for _ in 0..60 {
            c.ingest_fps_sample(70);
        }
        assert_eq!(c.quality(), QualityTier::Ultra);
    }

    #[test]
    fn test_no_transitions_closer_than_window() {
        let mut c = QualityController::new(60);
        c.configure_adaptive_quality(AdaptiveConfigUpdate {
            stability_window_frames: Some(8),
            ..Default::default()
        })
        .unwrap();

        let cycle = Arc::new(Mutex::new(0u32));
        let stamps = Arc::new(Mutex::new(Vec::new()));
        {
            let cycle = cycle.clone();
            let stamps = stamps.clone();
            c.on_quality_change(move |_| stamps.lock().unwrap().push(*cycle.lock().unwrap()));
        }

        // Alternate between long low and high bursts
        for i in 0..400u32 {
            *cycle.lock().unwrap() = i;
            let fps = if (i / 12) % 2 == 0 { 10 } else { 90 };
            c.ingest_fps_sample(fps);
        }

        let stamps = stamps.lock().unwrap();
        assert!(stamps.len() >= 2);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= 8, "transitions at {} and {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_manual_override_wins() {
        let mut c = QualityController::new(60);
        let log = transitions(&mut c);
        for _ in 0..30 {
            c.ingest_fps_sample(120);
        }
        assert_eq!(c.stability_counter(), 30);

        c.set_quality(QualityTier::Low);
        assert_eq!(c.quality(), QualityTier::Low);
        assert_eq!(c.stability_counter(), 0);
        assert!(!c.is_adaptive());
        assert_eq!(*log.lock().unwrap(), vec![QualityTier::Low]);

        // Paused: high FPS no longer moves the tier
        for _ in 0..100 {
            c.ingest_fps_sample(120);
        }
        assert_eq!(c.quality(), QualityTier::Low);

        // Re-armed: no immediate change, then the window applies again
        c.set_adaptive_mode(true);
        assert_eq!(c.quality(), QualityTier::Low);
        for _ in 0..60 {
            c.ingest_fps_sample(120);
        }
        assert_eq!(c.quality(), QualityTier::Ultra);
    }

    #[test]
    fn test_disable_adaptive_keeps_tier() {
        let mut c = QualityController::new(60);
        c.set_adaptive_mode(false);
        assert_eq!(c.quality(), QualityTier::High);
        assert_eq!(c.preference(), QualityPreference::High);
        c.apply_preference(QualityPreference::Auto);
        assert!(c.is_adaptive());
        assert_eq!(c.preference(), QualityPreference::Auto);
    }

    #[test]
    fn test_unsubscribed_callback_not_called() {
        let mut c = QualityController::new(60);
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let token = c.on_quality_change(move |tier| sink.lock().unwrap().push(tier));

        c.set_quality(QualityTier::Medium);
        assert!(c.unsubscribe(token));
        c.set_quality(QualityTier::Low);
        assert!(!c.unsubscribe(token));

        assert_eq!(*log.lock().unwrap(), vec![QualityTier::Medium]);
    }

    #[test]
    fn test_rejected_config_keeps_thresholds() {
        let mut c = QualityController::new(60);
        let before = *c.config();

        let result = c.configure_adaptive_quality(AdaptiveConfigUpdate::thresholds(
            50.0, 40.0, 55.0, 60.0,
        ));
        assert!(result.is_err());
        assert_eq!(*c.config(), before);

        c.configure_adaptive_quality(AdaptiveConfigUpdate::thresholds(20.0, 30.0, 40.0, 50.0))
            .unwrap();
        assert_eq!(c.config().fps_thresholds.low, 20.0);
    }

    #[test]
    fn test_reentrant_request_is_queued() {
        let mut c = QualityController::new(60);
        let requests = c.requests();
        let log = transitions(&mut c);
        c.on_quality_change(move |tier| {
            if tier == QualityTier::Low {
                requests.request(QualityTier::Medium);
            }
        });

        c.set_quality(QualityTier::Low);
        // Not applied during the notification
        assert_eq!(c.quality(), QualityTier::Low);

        c.ingest_fps_sample(40);
        assert_eq!(c.quality(), QualityTier::Medium);
        assert_eq!(*log.lock().unwrap(), vec![QualityTier::Low, QualityTier::Medium]);
    }

    #[test]
    fn test_request_on_every_change_advances_one_step_per_call() {
        let mut c = QualityController::new(60);
        let requests = c.requests();
        let log = transitions(&mut c);
        c.on_quality_change(move |tier| requests.request(tier.cycle()));

        c.set_quality(QualityTier::Low);
        assert_eq!(log.lock().unwrap().len(), 1);

        c.ingest_fps_sample(60);
        assert_eq!(c.quality(), QualityTier::Medium);
        assert_eq!(log.lock().unwrap().len(), 2);

        c.ingest_fps_sample(60);
        assert_eq!(c.quality(), QualityTier::High);
        assert_eq!(log.lock().unwrap().len(), 3);

        c.on_frame(0.0);
        c.on_frame(16.0);
        assert_eq!(c.quality(), QualityTier::Low);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                QualityTier::Low,
                QualityTier::Medium,
                QualityTier::High,
                QualityTier::Ultra,
                QualityTier::Low
            ]
        );
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive_downward() {
        // Defaults: low 30, medium 45, high 55, ultra 60, hysteresis 5
        let c = QualityController::new(60);
        assert_eq!(c.candidate_tier(25.0), QualityTier::Low);
        assert_eq!(c.candidate_tier(25.5), QualityTier::Medium);
        assert_eq!(c.candidate_tier(40.0), QualityTier::Medium);
        assert_eq!(c.candidate_tier(40.5), QualityTier::High);
        assert_eq!(c.candidate_tier(50.0), QualityTier::High);
        // Dead zone keeps the current tier
        assert_eq!(c.candidate_tier(50.5), QualityTier::High);
        assert_eq!(c.candidate_tier(64.9), QualityTier::High);
        assert_eq!(c.candidate_tier(65.0), QualityTier::Ultra);

        let mut ultra = QualityController::new(60);
        ultra.set_quality(QualityTier::Ultra);
        assert_eq!(ultra.candidate_tier(50.0), QualityTier::High);
        assert_eq!(ultra.candidate_tier(50.5), QualityTier::Ultra);
    }

    #[test]
    fn test_wall_clock_tick() {
        let mut c = QualityController::new(60);
        c.tick();
        c.tick();
        let m = c.metrics();
        assert!(m.fps > 0);
        assert!(c.fps_history().len() <= 1);
        assert!(m.frame_time_ms.is_finite() && m.frame_time_ms > 0.0);
        assert_eq!(c.quality(), QualityTier::High);
    }

    #[test]
    fn test_frames_drive_evaluation() {
        let feed = SharedRendererStats::new();
        feed.publish(RendererStats {
            triangles: Some(1_500_000),
            draw_calls: Some(150),
            ..Default::default()
        });
        let mut c = QualityController::with_provider(Box::new(feed), 60);
        c.configure_adaptive_quality(AdaptiveConfigUpdate {
            stability_window_frames: Some(3),
            ..Default::default()
        })
        .unwrap();

        // 50ms frames -> 20 FPS, finalized roughly every 550ms
        let mut now = 0.0;
        for _ in 0..80 {
            c.on_frame(now);
            now += 50.0;
        }

        let m = c.metrics();
        assert_eq!(m.fps, 20);
        assert!((m.frame_time_ms - 50.0).abs() < 1e-6);
        assert_eq!(m.triangle_count, 1_500_000);
        assert_eq!(m.quality_tier, QualityTier::Low);
        assert!(c.performance_score() < 60);
        assert_eq!(c.performance_grade(), Grade::F);

        let tips = c.optimization_tips();
        assert_eq!(tips.len(), 3);
        assert_eq!(c.current_profile(), c.resolve_profile(QualityTier::Low));
    }

    #[test]
    fn test_snapshot_never_reports_auto() {
        let mut c = QualityController::default();
        c.apply_preference(QualityPreference::Auto);
        let json = serde_json::to_value(c.metrics()).unwrap();
        assert_eq!(json["quality_tier"], "high");
    }
}
