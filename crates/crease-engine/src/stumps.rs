//! Stump-hit estimation.
//!
//! Two pieces of evidence: how many of the latest post-bounce detections
//! already sit inside the stump zone, and where a straight-line projection of
//! the final descent crosses the zone's centre line. The stronger one wins; a
//! caller-flagged direct hit overrides both.
//!
//! Zone hits are counted on frame-ordered detections before jitter removal,
//! so a ball that comes to rest against the stumps still counts once per
//! frame.

use tracing::debug;

use crease_models::{FrameSize, NormalizedPoint, Position, StumpProjection};

use crate::config::StumpConfig;
use crate::math::linear_fit;
use crate::trajectory::frame_ordered;

pub fn project_stumps(
    cleaned: &[Position],
    detections: &[Position],
    bounce_frame: Option<u32>,
    frame_size: FrameSize,
    direct_hit: bool,
    config: &StumpConfig,
) -> StumpProjection {
    let normalized: Vec<NormalizedPoint> = cleaned.iter().map(|p| p.normalized(frame_size)).collect();

    let after_bounce: Vec<NormalizedPoint> = frame_ordered(detections)
        .iter()
        .filter(|p| bounce_frame.map_or(true, |b| p.frame > b))
        .map(|p| p.normalized(frame_size))
        .collect();
    let window = config.recent_points.min(after_bounce.len());
    let zone_hits = after_bounce[after_bounce.len() - window..]
        .iter()
        .filter(|p| config.zone.contains(p.x, p.y))
        .count();
    let zone_confidence = if window > 0 {
        zone_hits as f64 / window as f64
    } else {
        0.0
    };

    let (projected_x, projection_confidence) = project(&normalized, config)
        .map(|(x, c)| (Some(x), c))
        .unwrap_or((None, 0.0));

    let confidence = if direct_hit {
        1.0
    } else {
        zone_confidence.max(projection_confidence).clamp(0.0, 1.0)
    };

    debug!(
        zone_hits,
        zone_confidence,
        projected_x = ?projected_x,
        projection_confidence,
        direct_hit,
        "Stump projection"
    );

    StumpProjection {
        confidence,
        zone_hits,
        zone_confidence,
        projected_x,
        projection_confidence,
        direct_hit,
    }
}

/// Fit `x = a + b y` over the last points and evaluate at the zone's centre
/// line. Only applies while the ball is still descending on screen.
fn project(points: &[NormalizedPoint], config: &StumpConfig) -> Option<(f64, f64)> {
    let m = config.projection_points.min(points.len());
    if m < 2 {
        return None;
    }
    let tail = &points[points.len() - m..];
    let (first, last) = (tail.first()?, tail.last()?);
    if last.y - first.y <= f64::EPSILON {
        return None;
    }

    let ys: Vec<f64> = tail.iter().map(|p| p.y).collect();
    let xs: Vec<f64> = tail.iter().map(|p| p.x).collect();
    let (intercept, slope, residual) = linear_fit(&ys, &xs)?;

    let zone = &config.zone;
    let plane_y = zone.center_y();
    let projected_x = intercept + slope * plane_y;
    if !projected_x.is_finite() {
        return None;
    }
    if projected_x < zone.x_min || projected_x > zone.x_max {
        return Some((projected_x, 0.0));
    }

    let centrality = 1.0 - 0.5 * (projected_x - zone.center_x()).abs() / zone.half_width();
    let stability = 1.0 / (1.0 + residual / config.lateral_variance_scale.max(f64::EPSILON));
    let gap = (plane_y - last.y).max(0.0);
    let reach = (1.0 - gap / config.max_projection_gap.max(f64::EPSILON)).max(0.0);

    Some((projected_x, (centrality * stability * reach).clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> FrameSize {
        FrameSize::new(1000, 1000)
    }

    #[test]
    fn test_points_inside_zone() {
        let mut points: Vec<Position> = (0..10).map(|i| Position::new(300.0, 100.0 + 20.0 * i as f64, i)).collect();
        points.extend((10..15).map(|i| Position::new(500.0, 700.0 + 10.0 * (i - 10) as f64, i)));

        let proj = project_stumps(&points, &points, Some(9), size(), false, &StumpConfig::default());
        assert_eq!(proj.zone_hits, 5);
        assert_eq!(proj.zone_confidence, 1.0);
        assert_eq!(proj.confidence, 1.0);
    }

    #[test]
    fn test_ball_at_rest_in_zone_counts_every_frame() {
        let mut detections: Vec<Position> =
            (0..10).map(|i| Position::new(300.0, 100.0 + 20.0 * i as f64, i)).collect();
        detections.extend((10..15).map(|i| Position::new(500.0, 750.0, i)));
        // jitter removal leaves one point for the resting ball
        let cleaned = &detections[..11];

        let proj = project_stumps(cleaned, &detections, Some(9), size(), false, &StumpConfig::default());
        assert_eq!(proj.zone_hits, 5);
        assert_eq!(proj.zone_confidence, 1.0);
        assert_eq!(proj.confidence, 1.0);
    }

    #[test]
    fn test_projection_toward_middle_stump() {
        // straight descent at x = 0.5, stopping short of the zone
        let points: Vec<Position> = (0..8).map(|i| Position::new(500.0, 200.0 + 50.0 * i as f64, i)).collect();
        let proj = project_stumps(&points, &points, None, size(), false, &StumpConfig::default());

        assert_eq!(proj.zone_hits, 0);
        assert!((proj.projected_x.unwrap() - 0.5).abs() < 1e-9);
        // last point at y = 0.55, centre line at 0.77
        let expected = 1.0 - 0.22 / 0.5;
        assert!((proj.projection_confidence - expected).abs() < 1e-6);
        assert_eq!(proj.confidence, proj.projection_confidence);
    }

    #[test]
    fn test_projection_wide_of_stumps() {
        let points: Vec<Position> = (0..8).map(|i| Position::new(200.0, 200.0 + 50.0 * i as f64, i)).collect();
        let proj = project_stumps(&points, &points, None, size(), false, &StumpConfig::default());
        assert_eq!(proj.projection_confidence, 0.0);
        assert_eq!(proj.confidence, 0.0);
    }

    #[test]
    fn test_rising_ball_is_not_projected() {
        let points: Vec<Position> = (0..8).map(|i| Position::new(500.0, 600.0 - 50.0 * i as f64, i)).collect();
        let proj = project_stumps(&points, &points, Some(0), size(), false, &StumpConfig::default());
        assert_eq!(proj.projected_x, None);
        assert_eq!(proj.confidence, 0.0);
    }

    #[test]
    fn test_direct_hit_overrides() {
        let points = vec![Position::new(10.0, 10.0, 0), Position::new(20.0, 5.0, 1)];
        let proj = project_stumps(&points, &points, None, size(), true, &StumpConfig::default());
        assert_eq!(proj.confidence, 1.0);
        assert!(proj.direct_hit);
    }
}
