//! Release speed estimation.
//!
//! Speed is the median per-step velocity over a short window after release,
//! converted to metres either through a pitch calibration or through an
//! empirical scale (assumed release-to-bounce distance over the observed
//! pixel chord). Readings outside the plausible range are never replaced by
//! a made-up value: the estimator falls back to the whole-flight average,
//! clamps readings that are only slightly out, or reports the speed as
//! unavailable.

use tracing::debug;

use crease_models::{EventMarkers, Position, Provenance, SpeedEstimate, SpeedOutcome, SpeedUnavailable, Trajectory};

use crate::calibration::PitchCalibration;
use crate::config::SpeedConfig;
use crate::math::{mad, median};

const MS_TO_KMPH: f64 = 3.6;
/// Valid steps needed for full step-count confidence.
const FULL_CONFIDENCE_STEPS: f64 = 6.0;
const DEGRADED_CONFIDENCE_FACTOR: f64 = 0.6;
const COARSE_CONFIDENCE: f64 = 0.5;

/// Pixel-to-metre conversion for one delivery.
enum Scale<'a> {
    Homography(&'a PitchCalibration),
    /// Metres per pixel.
    Empirical(f64),
}

impl Scale<'_> {
    fn metres(&self, a: &Position, b: &Position) -> Option<f64> {
        match self {
            Scale::Homography(cal) => cal.metres_between((a.x, a.y), (b.x, b.y)),
            Scale::Empirical(m_per_px) => Some(a.distance(b) * m_per_px),
        }
    }

    fn provenance(&self) -> Provenance {
        match self {
            Scale::Homography(_) => Provenance::PitchHomography,
            Scale::Empirical(_) => Provenance::EmpiricalScale,
        }
    }
}

pub fn estimate_speed(
    trajectory: &Trajectory,
    markers: &EventMarkers,
    calibration: Option<&PitchCalibration>,
    config: &SpeedConfig,
) -> SpeedOutcome {
    let unavailable = |reason: SpeedUnavailable| {
        debug!(reason = ?reason, "Speed unavailable");
        SpeedOutcome::Unavailable { reason }
    };

    let fps = trajectory.fps;
    if !(fps.is_finite() && fps > 0.0) {
        return unavailable(SpeedUnavailable::InvalidFps);
    }
    let points = &trajectory.cleaned;
    if points.len() < config.min_points.max(2) {
        return unavailable(SpeedUnavailable::TooFewPoints);
    }

    let (first, last) = (0, points.len() - 1);
    // flight end for scaling and the coarse average
    let (end, assumed_m) = match markers.bounce.filter(|&b| b > first && b <= last) {
        Some(b) => (b, config.release_to_bounce_m),
        None => (last, config.full_travel_m),
    };

    let scale = match calibration {
        Some(cal) => Scale::Homography(cal),
        None => {
            let chord = points[first].distance(&points[end]);
            if chord < config.min_scale_chord_px {
                return unavailable(SpeedUnavailable::NoDisplacement);
            }
            Scale::Empirical(assumed_m / chord)
        }
    };

    let start = config.release_skip_points.min(end);
    let stop = (start + config.release_window_points.saturating_sub(1)).min(end);
    let velocities: Vec<f64> = points[start..=stop]
        .windows(2)
        .filter_map(|w| {
            let frames = w[1].frame.saturating_sub(w[0].frame).max(1) as f64;
            let px_per_frame = w[0].distance(&w[1]) / frames;
            if px_per_frame < config.min_step_px || px_per_frame > config.max_step_px {
                return None;
            }
            scale.metres(&w[0], &w[1]).map(|m| m / frames * fps)
        })
        .collect();

    let windowed = (velocities.len() >= config.min_steps.max(1)).then(|| median(&velocities) * MS_TO_KMPH);
    let coarse = {
        let secs = points[end].frame.saturating_sub(points[first].frame) as f64 / fps;
        let metres = match scale {
            Scale::Homography(_) => scale.metres(&points[first], &points[end]),
            Scale::Empirical(_) => Some(assumed_m),
        };
        metres
            .filter(|_| secs > 0.0)
            .map(|m| m / secs * MS_TO_KMPH)
            .filter(|v| v.is_finite() && *v > 0.0)
    };

    let window_confidence = if velocities.is_empty() {
        0.0
    } else {
        let m = median(&velocities);
        let dispersion = if m > 0.0 { mad(&velocities) / m } else { 1.0 };
        (velocities.len() as f64 / FULL_CONFIDENCE_STEPS).min(1.0) / (1.0 + 2.0 * dispersion)
    };

    let in_range = |v: f64| v >= config.min_valid_kmph && v <= config.max_valid_kmph;
    let measured = |kmph: f64, confidence: f64, provenance: Provenance, degraded: bool| {
        let confidence = if degraded {
            confidence * DEGRADED_CONFIDENCE_FACTOR
        } else {
            confidence
        };
        debug!(kmph, confidence, provenance = provenance.as_str(), degraded, "Speed measured");
        SpeedOutcome::Measured(SpeedEstimate {
            kmph,
            confidence: confidence.clamp(0.0, 1.0),
            provenance,
            degraded,
        })
    };

    match (windowed, coarse) {
        (Some(v), _) if in_range(v) => measured(v, window_confidence, scale.provenance(), false),
        (_, Some(c)) if in_range(c) => measured(c, COARSE_CONFIDENCE, Provenance::CoarseAverage, true),
        (None, None) => unavailable(SpeedUnavailable::TooFewPoints),
        (w, c) => {
            let (reading, confidence) = match w {
                Some(v) => (v, window_confidence),
                None => (c.unwrap_or(0.0), COARSE_CONFIDENCE),
            };
            let lo = config.min_valid_kmph * (1.0 - config.clamp_tolerance);
            let hi = config.max_valid_kmph * (1.0 + config.clamp_tolerance);
            if reading >= lo && reading <= hi {
                let clamped = reading.clamp(config.min_valid_kmph, config.max_valid_kmph);
                measured(clamped, confidence, scale.provenance(), true)
            } else {
                debug!(reading, "Speed outside plausible range");
                unavailable(SpeedUnavailable::OutOfRange)
            }
        }
    }
}
