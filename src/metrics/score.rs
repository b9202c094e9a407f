//! Performance score, letter grade and optimization tips

use super::MetricsSnapshot;
use crate::quality::QualityTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame budget the frame-time sub-score is measured against (60fps)
const REFERENCE_FRAME_TIME_MS: f64 = 1000.0 / 60.0;
/// Draw calls at which draw-call headroom reaches zero
const DRAW_CALL_BUDGET: f64 = 500.0;
/// Triangles at which triangle headroom reaches zero
const TRIANGLE_BUDGET: f64 = 5_000_000.0;

const WEIGHT_FPS: f64 = 0.50;
const WEIGHT_FRAME_TIME: f64 = 0.20;
const WEIGHT_DRAW_CALLS: f64 = 0.15;
const WEIGHT_TRIANGLES: f64 = 0.15;

/// Letter grade derived from the performance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Band lower edges are inclusive
    pub fn from_score(score: u32) -> Self {
        match score {
            90..=u32::MAX => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

fn pct(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Weighted 0..=100 score for `m`
pub fn performance_score(m: &MetricsSnapshot) -> u32 {
    let fps_score = pct(m.fps as f64 / m.target_fps.max(1) as f64 * 100.0);
    let frame_time_score = pct(REFERENCE_FRAME_TIME_MS / m.frame_time_ms.max(f64::EPSILON) * 100.0);
    let draw_call_score = pct(100.0 - m.draw_calls as f64 / DRAW_CALL_BUDGET * 100.0);
    let triangle_score = pct(100.0 - m.triangle_count as f64 / TRIANGLE_BUDGET * 100.0);

    let weighted = fps_score * WEIGHT_FPS
        + frame_time_score * WEIGHT_FRAME_TIME
        + draw_call_score * WEIGHT_DRAW_CALLS
        + triangle_score * WEIGHT_TRIANGLES;
    weighted.round().clamp(0.0, 100.0) as u32
}

pub fn performance_grade(m: &MetricsSnapshot) -> Grade {
    Grade::from_score(performance_score(m))
}

/// Advisory strings, in fixed check order. May be empty.
pub fn optimization_tips(m: &MetricsSnapshot) -> Vec<String> {
    let mut tips = Vec::new();

    if (m.fps as f64) < m.target_fps as f64 * 0.8 {
        tips.push(format!(
            "FPS ({}) is below 80% of the {} FPS target: enable automatic quality",
            m.fps, m.target_fps
        ));
    }
    if m.triangle_count > 1_000_000 {
        tips.push(format!(
            "{} triangles on screen: use LOD meshes or reduce geometry",
            m.triangle_count
        ));
    }
    if m.draw_calls > 100 {
        tips.push(format!(
            "{} draw calls per frame: batch or instance meshes",
            m.draw_calls
        ));
    }
    if m.memory_mb > 500.0 {
        tips.push(format!(
            "{:.0} MB in use: lower texture quality",
            m.memory_mb
        ));
    }
    if m.quality_tier == QualityTier::Ultra && m.fps < 50 {
        tips.push("Ultra quality is running below 50 FPS: step down to High".to_string());
    }

    tips
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(fps: u32) -> MetricsSnapshot {
        MetricsSnapshot {
            fps,
            frame_time_ms: 1000.0 / fps.max(1) as f64,
            triangle_count: 0,
            draw_calls: 0,
            texture_count: 0,
            geometry_count: 0,
            material_count: 0,
            memory_mb: 0.0,
            target_fps: 60,
            quality_tier: QualityTier::High,
        }
    }

    #[test]
    fn test_perfect_score() {
        let m = snapshot(60);
        assert_eq!(performance_score(&m), 100);
        assert_eq!(performance_grade(&m), Grade::A);
        assert!(optimization_tips(&m).is_empty());
    }

    #[test]
    fn test_weighted_components() {
        // fps 30/60 -> 50 * 0.5 = 25; frame time 16.67/33.3 -> 50 * 0.2 = 10
        // draw calls 250/500 -> 50 * 0.15 = 7.5; triangles 2.5M/5M -> 50 * 0.15 = 7.5
        let m = MetricsSnapshot {
            draw_calls: 250,
            triangle_count: 2_500_000,
            ..snapshot(30)
        };
        assert_eq!(performance_score(&m), 50);
        assert_eq!(performance_grade(&m), Grade::F);
    }

    #[test]
    fn test_grade_boundaries_inclusive() {
        assert_eq!(Grade::from_score(100), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(80), Grade::B);
        assert_eq!(Grade::from_score(70), Grade::C);
        assert_eq!(Grade::from_score(60), Grade::D);
        assert_eq!(Grade::from_score(59), Grade::F);
        assert_eq!(Grade::from_score(0), Grade::F);
    }

    #[test]
    fn test_score_monotonic_in_fps() {
        let mut previous = 0;
        for fps in 0..=60 {
            let m = MetricsSnapshot {
                frame_time_ms: 20.0,
                draw_calls: 120,
                triangle_count: 1_500_000,
                memory_mb: 300.0,
                ..snapshot(fps)
            };
            let score = performance_score(&m);
            assert!(score >= previous, "score dropped at {fps} fps");
            previous = score;
        }
    }

    #[test]
    fn test_degenerate_inputs_stay_in_range() {
        let m = MetricsSnapshot {
            frame_time_ms: 0.0,
            target_fps: 0,
            draw_calls: u64::MAX,
            triangle_count: u64::MAX,
            ..snapshot(1000)
        };
        let score = performance_score(&m);
        assert!(score <= 100);
    }

    #[test]
    fn test_tips_fire_in_order() {
        let m = MetricsSnapshot {
            fps: 40,
            triangle_count: 2_000_000,
            draw_calls: 150,
            memory_mb: 800.0,
            quality_tier: QualityTier::Ultra,
            ..snapshot(40)
        };
        let tips = optimization_tips(&m);
        assert_eq!(tips.len(), 5);
        assert!(tips[0].contains("automatic quality"));
        assert!(tips[1].contains("LOD"));
        assert!(tips[2].contains("batch"));
        assert!(tips[3].contains("texture"));
        assert!(tips[4].contains("step down"));
    }

    #[test]
    fn test_ultra_tip_needs_ultra_tier() {
        let m = snapshot(45);
        let tips = optimization_tips(&m);
        assert_eq!(tips.len(), 1);
        assert!(!tips.iter().any(|t| t.contains("Ultra")));
    }
}
