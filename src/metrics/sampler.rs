//! Per-frame timing sampler (zero-allocation ring buffer)
//!
//! Frame times are smoothed over the last [`FRAME_WINDOW`] frames using a
//! cached running sum. FPS is finalized from raw frame counts every
//! [`FPS_FINALIZE_INTERVAL_MS`] and kept in a short history used by the
//! quality controller.

use super::{RendererCounters, RendererStatsProvider};
use std::collections::VecDeque;
use std::time::Instant;

/// Frames averaged for the smoothed frame time (~1s at 60fps)
pub const FRAME_WINDOW: usize = 60;
/// Finalized FPS samples kept for adaptive evaluation
pub const FPS_HISTORY_LEN: usize = 10;
/// FPS is finalized once accumulated time exceeds this
pub const FPS_FINALIZE_INTERVAL_MS: f64 = 500.0;
/// Replacement for non-positive frame deltas
pub const FRAME_TIME_EPSILON_MS: f64 = 0.001;

/// Turns a stream of frame timestamps into smoothed frame time and FPS.
pub struct MetricsSampler {
    /// Ring buffer for frame times (ms)
    frame_times: [f64; FRAME_WINDOW],
    /// Next write index
    head: usize,
    /// Valid entries in the ring buffer
    len: usize,
    /// Cached sum of valid entries
    total_time: f64,
    last_timestamp: Option<f64>,
    frames_since_finalize: u32,
    elapsed_since_finalize: f64,
    fps: u32,
    fps_history: VecDeque<u32>,
    counters: RendererCounters,
    provider: Box<dyn RendererStatsProvider>,
    /// Origin for `tick()`
    epoch: Instant,
}

impl MetricsSampler {
    /// Create a sampler that reports `target_fps` until real data arrives.
    pub fn new(provider: Box<dyn RendererStatsProvider>, target_fps: u32) -> Self {
        Self {
            frame_times: [0.0; FRAME_WINDOW],
            head: 0,
            len: 0,
            total_time: 0.0,
            last_timestamp: None,
            frames_since_finalize: 0,
            elapsed_since_finalize: 0.0,
            fps: target_fps,
            fps_history: VecDeque::with_capacity(FPS_HISTORY_LEN),
            counters: RendererCounters::default(),
            provider,
            epoch: Instant::now(),
        }
    }

    /// Record a frame at `now_ms` on a monotonic clock.
    ///
    /// Returns the newly finalized FPS when this frame closed an FPS
    /// interval. The very first call only establishes the baseline.
    pub fn record_frame(&mut self, now_ms: f64) -> Option<u32> {
        let last = self.last_timestamp.replace(now_ms)?;

        let mut elapsed = now_ms - last;
        if !elapsed.is_finite() || elapsed <= 0.0 {
            elapsed = FRAME_TIME_EPSILON_MS;
        }

        // Ring buffer update: subtract evicted value, add new value
        if self.len == FRAME_WINDOW {
            self.total_time -= self.frame_times[self.head];
        } else {
            self.len += 1;
        }
        self.frame_times[self.head] = elapsed;
        self.total_time += elapsed;
        self.head = (self.head + 1) % FRAME_WINDOW;

        self.frames_since_finalize += 1;
        self.elapsed_since_finalize += elapsed;

        if self.elapsed_since_finalize > FPS_FINALIZE_INTERVAL_MS {
            let fps = (self.frames_since_finalize as f64 * 1000.0 / self.elapsed_since_finalize)
                .round() as u32;
            self.frames_since_finalize = 0;
            self.elapsed_since_finalize = 0.0;
            self.push_fps(fps);
            tracing::debug!(fps, frame_time_ms = self.frame_time_ms(), "FPS finalized");
            return Some(fps);
        }
        None
    }

    /// Record a frame using the sampler's own monotonic clock
    pub fn tick(&mut self) -> Option<u32> {
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.record_frame(now_ms)
    }

    /// Push a finalized FPS value into the history and pull renderer counters
    pub fn push_fps(&mut self, fps: u32) {
        if self.fps_history.len() == FPS_HISTORY_LEN {
            self.fps_history.pop_front();
        }
        self.fps_history.push_back(fps);
        self.fps = fps;
        self.counters.merge(&self.provider.renderer_stats());
    }

    /// Mean frame time over the window; `1000 / fps` before any frame
    pub fn frame_time_ms(&self) -> f64 {
        if self.len == 0 {
            return 1000.0 / self.fps.max(1) as f64;
        }
        (self.total_time / self.len as f64).max(FRAME_TIME_EPSILON_MS)
    }

    /// Most recently finalized FPS
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Finalized FPS values, oldest first
    pub fn fps_history(&self) -> impl Iterator<Item = u32> + '_ {
        self.fps_history.iter().copied()
    }

    /// Mean of the FPS history, `None` while empty
    pub fn average_fps(&self) -> Option<f64> {
        if self.fps_history.is_empty() {
            return None;
        }
        let sum: u64 = self.fps_history.iter().map(|&f| f as u64).sum();
        Some(sum as f64 / self.fps_history.len() as f64)
    }

    pub fn counters(&self) -> &RendererCounters {
        &self.counters
    }
}
