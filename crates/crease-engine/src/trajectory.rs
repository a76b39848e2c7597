//! Trajectory builder: raw positions to a cleaned, segmented path.
//!
//! 1. Order by frame and drop stationary jitter.
//! 2. Smooth with a short centred moving average (endpoints kept).
//! 3. Locate the bounce at the lowest on-screen vertical reversal.
//! 4. Split at the bounce and fit `x(t)`, `y(t)` quadratics per segment.
//! 5. Scan step velocities for the sharpest deceleration (contact).

use tracing::debug;

use crease_models::{EventMarkers, FrameSize, InsufficientReason, Position, Trajectory};

use crate::config::TrajectoryConfig;
use crate::math::{fit_rmse, median, polyfit};

/// Quadratic fits of one segment, `t` in seconds from the segment's first point.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentFit {
    /// `x(t) = x[0] + x[1] t + x[2] t^2`, pixels.
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub rmse_x: f64,
    pub rmse_y: f64,
    pub points: usize,
    /// Seconds between the segment's first and last point.
    pub duration: f64,
    /// Straight-line pixel distance between the segment's endpoints.
    pub chord_px: f64,
}

impl SegmentFit {
    /// Lateral acceleration in px/s^2.
    pub fn lateral_accel(&self) -> f64 {
        2.0 * self.x[2]
    }

    /// Mean speed along the chord in px/s.
    pub fn mean_speed(&self) -> f64 {
        if self.duration > 0.0 {
            self.chord_px / self.duration
        } else {
            0.0
        }
    }
}

/// A successfully built trajectory with its markers and segment fits.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTrajectory {
    pub trajectory: Trajectory,
    pub markers: EventMarkers,
    pub pre_bounce: SegmentFit,
    pub post_bounce: SegmentFit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrajectoryOutcome {
    Built(BuiltTrajectory),
    Insufficient {
        reason: InsufficientReason,
        /// Whatever survived cleaning, for display.
        cleaned: Vec<Position>,
    },
}

impl TrajectoryOutcome {
    pub fn built(&self) -> Option<&BuiltTrajectory> {
        match self {
            TrajectoryOutcome::Built(b) => Some(b),
            TrajectoryOutcome::Insufficient { .. } => None,
        }
    }
}

pub fn build_trajectory(
    positions: &[Position],
    fps: f64,
    frame_size: FrameSize,
    config: &TrajectoryConfig,
) -> TrajectoryOutcome {
    let cleaned = remove_jitter(positions, config.jitter_floor_px);
    let insufficient = |reason: InsufficientReason, cleaned: Vec<Position>| {
        debug!(reason = %reason, points = cleaned.len(), "Trajectory insufficient");
        TrajectoryOutcome::Insufficient { reason, cleaned }
    };

    if cleaned.len() < config.min_points {
        return insufficient(InsufficientReason::TooFewPoints, cleaned);
    }
    if !(fps.is_finite() && fps > 0.0) {
        return insufficient(InsufficientReason::FitFailed, cleaned);
    }

    let smoothed = smooth(&cleaned, config.smoothing_window);
    let n = smoothed.len();

    let bounce = find_bounce(&smoothed);
    let min_seg = config.min_segment_points.max(1);
    if bounce + 1 < min_seg || n - bounce < min_seg {
        return insufficient(InsufficientReason::NoClearPitch, cleaned);
    }

    let (Some(pre_bounce), Some(post_bounce)) = (
        fit_segment(&smoothed[..=bounce], fps),
        fit_segment(&smoothed[bounce..], fps),
    ) else {
        return insufficient(InsufficientReason::FitFailed, cleaned);
    };

    let contact = find_contact(&smoothed, bounce, config);
    let markers = EventMarkers {
        release: Some(0),
        bounce: Some(bounce),
        contact,
    };

    debug!(
        points = n,
        bounce,
        contact = ?contact,
        pre_ax = pre_bounce.lateral_accel(),
        post_ax = post_bounce.lateral_accel(),
        "Trajectory built"
    );

    TrajectoryOutcome::Built(BuiltTrajectory {
        trajectory: Trajectory {
            cleaned,
            smoothed,
            fps,
            frame_size,
        },
        markers,
        pre_bounce,
        post_bounce,
    })
}

/// Order by frame and drop points that barely moved from the last kept one.
/// Duplicate detections for an already-kept frame are dropped too.
pub fn remove_jitter(positions: &[Position], floor_px: f64) -> Vec<Position> {
    let ordered = frame_ordered(positions);

    let mut kept: Vec<Position> = Vec::with_capacity(ordered.len());
    for p in ordered {
        match kept.last() {
            Some(last) if last.distance(&p) < floor_px => {}
            _ => kept.push(p),
        }
    }
    kept
}

/// Finite positions sorted by frame, first detection per frame. Stationary
/// points are kept.
pub fn frame_ordered(positions: &[Position]) -> Vec<Position> {
    let mut ordered: Vec<Position> = positions
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    ordered.sort_by_key(|p| p.frame);
    ordered.dedup_by_key(|p| p.frame);
    ordered
}

/// Centred moving average. The first and last `window / 2` points are kept as-is.
pub fn smooth(points: &[Position], window: usize) -> Vec<Position> {
    let half = window.max(1) / 2;
    if half == 0 || points.len() < 2 * half + 1 {
        return points.to_vec();
    }

    let mut out = points.to_vec();
    for i in half..points.len() - half {
        let span = &points[i - half..=i + half];
        let k = span.len() as f64;
        out[i].x = span.iter().map(|p| p.x).sum::<f64>() / k;
        out[i].y = span.iter().map(|p| p.y).sum::<f64>() / k;
    }
    out
}

/// Index of the bounce: among downward-then-upward reversals (image y grows
/// downward), the one lowest on screen. Falls back to the maximum y.
pub fn find_bounce(points: &[Position]) -> usize {
    let reversal = (1..points.len().saturating_sub(1))
        .filter(|&i| points[i].y - points[i - 1].y > 0.0 && points[i + 1].y - points[i].y <= 0.0)
        .max_by(|&a, &b| points[a].y.total_cmp(&points[b].y));

    reversal.unwrap_or_else(|| {
        points
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.y.total_cmp(&b.1.y))
            .map(|(i, _)| i)
            .unwrap_or(0)
    })
}

fn fit_segment(points: &[Position], fps: f64) -> Option<SegmentFit> {
    let first = points.first()?;
    let last = points.last()?;
    let ts: Vec<f64> = points
        .iter()
        .map(|p| p.frame.saturating_sub(first.frame) as f64 / fps)
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();

    let x = polyfit(&ts, &xs, 2)?;
    let y = polyfit(&ts, &ys, 2)?;

    Some(SegmentFit {
        rmse_x: fit_rmse(&x, &ts, &xs),
        rmse_y: fit_rmse(&y, &ts, &ys),
        x,
        y,
        points: points.len(),
        duration: ts.last().copied().unwrap_or(0.0),
        chord_px: first.distance(last),
    })
}

/// Per-frame step speed between consecutive points, in px/frame.
pub fn step_velocities(points: &[Position]) -> Vec<f64> {
    points
        .windows(2)
        .map(|w| w[0].distance(&w[1]) / w[1].frame.saturating_sub(w[0].frame).max(1) as f64)
        .collect()
}

/// Sharpest qualifying deceleration, excluding the bounce and its neighbours.
fn find_contact(points: &[Position], bounce: usize, config: &TrajectoryConfig) -> Option<usize> {
    let v = step_velocities(points);
    if v.len() < config.min_contact_velocities {
        return None;
    }

    let floor = config.contact_min_velocity_fraction * median(&v);
    (1..v.len())
        .filter(|&i| i + 1 < bounce || i > bounce + 1)
        .filter(|&i| v[i - 1] > floor && v[i - 1] > 0.0)
        .map(|i| (i, v[i] / v[i - 1]))
        .filter(|&(_, ratio)| ratio < config.deceleration_ratio)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> FrameSize {
        FrameSize::new(1280, 720)
    }

    /// Constant lateral velocity, y down 6 px/frame to a bounce at 30, then up 5 px/frame.
    fn parabola(n: u32) -> Vec<Position> {
        (0..n)
            .map(|i| {
                let y = if i <= 30 {
                    100.0 + 6.0 * i as f64
                } else {
                    280.0 - 5.0 * (i - 30) as f64
                };
                Position::new(100.0 + 6.0 * i as f64, y, i)
            })
            .collect()
    }

    #[test]
    fn test_builds_parabola() {
        let outcome = build_trajectory(&parabola(60), 60.0, size(), &TrajectoryConfig::default());
        let built = outcome.built().expect("trajectory should build");

        assert_eq!(built.markers.bounce, Some(30));
        assert_eq!(built.markers.release, Some(0));
        assert_eq!(built.markers.contact, None);
        assert_eq!(built.trajectory.len(), 60);
        assert!(built.pre_bounce.lateral_accel().abs() < 1e-6);
        assert!(built.post_bounce.lateral_accel().abs() < 1e-6);
    }

    #[test]
    fn test_too_few_points() {
        let outcome = build_trajectory(&parabola(5), 30.0, size(), &TrajectoryConfig::default());
        assert!(matches!(
            outcome,
            TrajectoryOutcome::Insufficient { reason: InsufficientReason::TooFewPoints, .. }
        ));
    }

    #[test]
    fn test_no_clear_pitch_when_bounce_at_end() {
        // y only ever increases: the lowest point is the last one
        let points: Vec<Position> = (0..10)
            .map(|i| Position::new(10.0 * i as f64, 5.0 * i as f64, i))
            .collect();
        let outcome = build_trajectory(&points, 30.0, size(), &TrajectoryConfig::default());
        assert!(matches!(
            outcome,
            TrajectoryOutcome::Insufficient { reason: InsufficientReason::NoClearPitch, .. }
        ));
    }

    #[test]
    fn test_invalid_fps_fails_fit() {
        let outcome = build_trajectory(&parabola(60), 0.0, size(), &TrajectoryConfig::default());
        assert!(matches!(
            outcome,
            TrajectoryOutcome::Insufficient { reason: InsufficientReason::FitFailed, .. }
        ));
    }

    #[test]
    fn test_jitter_removal() {
        let points = vec![
            Position::new(0.0, 0.0, 0),
            Position::new(0.5, 0.5, 1),
            Position::new(10.0, 0.0, 3),
            Position::new(11.0, 0.0, 3),
            Position::new(5.0, 0.0, 2),
        ];
        let kept = remove_jitter(&points, 1.5);
        let frames: Vec<u32> = kept.iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![0, 2, 3]);
    }

    #[test]
    fn test_frame_ordered_keeps_stationary_points() {
        let points = vec![
            Position::new(640.0, 554.0, 7),
            Position::new(640.0, 554.0, 5),
            Position::new(f64::NAN, 1.0, 4),
            Position::new(640.0, 554.0, 6),
            Position::new(100.0, 100.0, 5),
        ];
        let ordered = frame_ordered(&points);
        let frames: Vec<u32> = ordered.iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![5, 6, 7]);
        assert_eq!(ordered[0].x, 640.0);
        assert_eq!(remove_jitter(&points, 1.5).len(), 1);
    }

    #[test]
    fn test_smoothing_keeps_endpoints() {
        let points = vec![
            Position::new(0.0, 0.0, 0),
            Position::new(3.0, 9.0, 1),
            Position::new(6.0, 0.0, 2),
            Position::new(9.0, 0.0, 3),
        ];
        let s = smooth(&points, 3);
        assert_eq!(s[0], points[0]);
        assert_eq!(s[3], points[3]);
        assert!((s[1].y - 3.0).abs() < 1e-12);
        assert!((s[2].x - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_contact_detected_on_sharp_slowdown() {
        // ~20 px/frame through the bounce, then a sudden drop to 2 px/frame after frame 25
        let mut points = Vec::new();
        let mut x = 0.0;
        for i in 0..40u32 {
            let y = match i {
                0..=10 => 100.0 + 8.0 * i as f64,
                11..=25 => 180.0 - 6.0 * (i - 10) as f64,
                _ => 90.0,
            };
            x += if i > 25 { 2.0 } else { 20.0 };
            points.push(Position::new(x, y, i));
        }

        let built = build_trajectory(&points, 30.0, size(), &TrajectoryConfig::default());
        let built = built.built().unwrap();
        let contact = built.markers.contact.expect("contact expected");
        assert!((24..=27).contains(&contact), "contact at {contact}");
    }

    #[test]
    fn test_bounce_prefers_lowest_reversal() {
        let ys = [10.0, 20.0, 15.0, 30.0, 50.0, 40.0, 35.0];
        let points: Vec<Position> = ys
            .iter()
            .enumerate()
            .map(|(i, &y)| Position::new(i as f64, y, i as u32))
            .collect();
        assert_eq!(find_bounce(&points), 4);
    }
}
