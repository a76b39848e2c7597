//! Swing and spin classification from segment fits.
//!
//! Sign convention: the camera sits behind the bowler, image x grows to the
//! right and the batter is right-handed. A right-hander's leg side is then
//! screen right, so:
//!
//! - positive lateral acceleration before the bounce is inswing, negative outswing
//! - a positive change in lateral acceleration across the bounce is off-spin,
//!   a negative change leg-spin
//!
//! Mirrored footage is unmirrored (`x' = width - x`) before any of this runs,
//! and a left-handed batter flips the sign.

use serde::{Deserialize, Serialize};

use crease_models::{FrameSize, Position, Provenance, SpinEstimate, SpinType, SwingEstimate, SwingType};

use crate::config::ClassifierConfig;
use crate::trajectory::SegmentFit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatterHand {
    #[default]
    Right,
    Left,
}

impl BatterHand {
    /// Multiplier that maps screen-right onto the batter's leg side.
    pub fn sign(&self) -> f64 {
        match self {
            BatterHand::Right => 1.0,
            BatterHand::Left => -1.0,
        }
    }
}

/// Whether the footage is horizontally mirrored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraOrientation {
    #[default]
    Standard,
    Mirrored,
}

impl CameraOrientation {
    pub fn from_mirrored(mirrored: bool) -> Self {
        if mirrored {
            CameraOrientation::Mirrored
        } else {
            CameraOrientation::Standard
        }
    }

    /// Map positions into the standard orientation.
    pub fn unmirror(&self, positions: &[Position], frame_size: FrameSize) -> Vec<Position> {
        match self {
            CameraOrientation::Standard => positions.to_vec(),
            CameraOrientation::Mirrored => positions
                .iter()
                .map(|p| Position::new(frame_size.width_f() - p.x, p.y, p.frame))
                .collect(),
        }
    }
}

/// Heading change over a segment, in degrees, for a lateral acceleration
/// `accel` (px/s^2) acting over the whole segment.
fn heading_change_deg(accel: f64, fit: &SegmentFit) -> Option<f64> {
    let speed = fit.mean_speed();
    if fit.duration <= 0.0 || speed <= 0.0 || !accel.is_finite() {
        return None;
    }
    Some((accel * fit.duration).atan2(speed).to_degrees())
}

fn fit_confidence(fit: &SegmentFit, config: &ClassifierConfig) -> f64 {
    let quality = 1.0 / (1.0 + fit.rmse_x / config.fit_rmse_scale_px.max(f64::EPSILON));
    let coverage = (fit.points as f64 / config.full_coverage_points.max(1) as f64).min(1.0);
    (quality * coverage).clamp(0.0, 1.0)
}

/// Classify swing from the pre-bounce segment.
pub fn classify_swing(
    pre_bounce: &SegmentFit,
    frame_size: FrameSize,
    batter: BatterHand,
    config: &ClassifierConfig,
) -> SwingEstimate {
    let accel = pre_bounce.lateral_accel() * batter.sign();
    let Some(degrees) = heading_change_deg(accel, pre_bounce) else {
        return SwingEstimate {
            swing: SwingType::Unknown,
            degrees: None,
            confidence: 0.0,
            provenance: Provenance::QuadraticFit,
        };
    };

    let accel_widths = accel.abs() / frame_size.width_f().max(1.0);
    let swing = if accel_widths < config.swing_accel_floor || degrees.abs() < config.dead_zone_deg {
        SwingType::Straight
    } else if degrees > 0.0 {
        SwingType::Inswing
    } else {
        SwingType::Outswing
    };

    SwingEstimate {
        swing,
        degrees: Some(degrees),
        confidence: fit_confidence(pre_bounce, config),
        provenance: Provenance::QuadraticFit,
    }
}

/// Classify spin from the change in lateral acceleration across the bounce.
pub fn classify_spin(
    pre_bounce: &SegmentFit,
    post_bounce: &SegmentFit,
    frame_size: FrameSize,
    batter: BatterHand,
    config: &ClassifierConfig,
) -> SpinEstimate {
    let turn = (post_bounce.lateral_accel() - pre_bounce.lateral_accel()) * batter.sign();
    let Some(degrees) = heading_change_deg(turn, post_bounce) else {
        return SpinEstimate {
            spin: SpinType::NoSpin,
            degrees: None,
            confidence: 0.0,
            provenance: Provenance::QuadraticFit,
        };
    };

    let turn_widths = turn.abs() / frame_size.width_f().max(1.0);
    let spin = if turn_widths < config.spin_accel_floor || degrees.abs() < config.dead_zone_deg {
        SpinType::NoSpin
    } else if degrees > 0.0 {
        SpinType::OffSpin
    } else {
        SpinType::LegSpin
    };

    SpinEstimate {
        spin,
        degrees: Some(degrees),
        confidence: fit_confidence(pre_bounce, config).min(fit_confidence(post_bounce, config)),
        provenance: Provenance::QuadraticFit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> FrameSize {
        FrameSize::new(1280, 720)
    }

    /// A segment 0.5 s long covering 300 px, with lateral accel `ax` px/s^2.
    fn fit(ax: f64) -> SegmentFit {
        SegmentFit {
            x: vec![100.0, 0.0, ax / 2.0],
            y: vec![100.0, 600.0, 0.0],
            rmse_x: 0.0,
            rmse_y: 0.0,
            points: 16,
            duration: 0.5,
            chord_px: 300.0,
        }
    }

    #[test]
    fn test_swing_direction() {
        let cfg = ClassifierConfig::default();
        // 400 px/s^2 over 0.5 s against 600 px/s: ~18 degrees
        let inswing = classify_swing(&fit(400.0), size(), BatterHand::Right, &cfg);
        assert_eq!(inswing.swing, SwingType::Inswing);
        assert!(inswing.degrees.unwrap() > 10.0);
        assert!((inswing.confidence - 1.0).abs() < 1e-9);

        let outswing = classify_swing(&fit(-400.0), size(), BatterHand::Right, &cfg);
        assert_eq!(outswing.swing, SwingType::Outswing);
        assert!(outswing.degrees.unwrap() < -10.0);
    }

    #[test]
    fn test_left_hander_flips_swing() {
        let cfg = ClassifierConfig::default();
        let swing = classify_swing(&fit(400.0), size(), BatterHand::Left, &cfg);
        assert_eq!(swing.swing, SwingType::Outswing);
    }

    #[test]
    fn test_small_acceleration_is_straight() {
        let cfg = ClassifierConfig::default();
        // 10 px/s^2 is under 0.02 frame widths/s^2
        let swing = classify_swing(&fit(10.0), size(), BatterHand::Right, &cfg);
        assert_eq!(swing.swing, SwingType::Straight);
        assert!(swing.degrees.is_some());
    }

    #[test]
    fn test_degenerate_segment_is_unknown() {
        let mut segment = fit(400.0);
        segment.duration = 0.0;
        let swing = classify_swing(&segment, size(), BatterHand::Right, &ClassifierConfig::default());
        assert_eq!(swing.swing, SwingType::Unknown);
        assert_eq!(swing.degrees, None);
    }

    #[test]
    fn test_spin_direction() {
        let cfg = ClassifierConfig::default();
        let off = classify_spin(&fit(0.0), &fit(500.0), size(), BatterHand::Right, &cfg);
        assert_eq!(off.spin, SpinType::OffSpin);

        let leg = classify_spin(&fit(0.0), &fit(-500.0), size(), BatterHand::Right, &cfg);
        assert_eq!(leg.spin, SpinType::LegSpin);

        let lefty = classify_spin(&fit(0.0), &fit(-500.0), size(), BatterHand::Left, &cfg);
        assert_eq!(lefty.spin, SpinType::OffSpin);

        // swing carried through the bounce is not spin
        let none = classify_spin(&fit(400.0), &fit(400.0), size(), BatterHand::Right, &cfg);
        assert_eq!(none.spin, SpinType::NoSpin);
    }

    #[test]
    fn test_unmirror_restores_direction() {
        let points = vec![Position::new(100.0, 50.0, 0), Position::new(1000.0, 60.0, 1)];
        let flipped = CameraOrientation::Mirrored.unmirror(&points, size());
        assert_eq!(flipped[0].x, 1180.0);
        assert_eq!(flipped[1].x, 280.0);
        assert_eq!(flipped[1].frame, 1);
        assert_eq!(CameraOrientation::Mirrored.unmirror(&flipped, size()), points);
        assert_eq!(CameraOrientation::Standard.unmirror(&points, size()), points);
    }
}
