//! Shot analysis from post-contact travel: outcome, wagon-wheel zone and
//! timing/power scores.
//!
//! Exit bearing is measured from straight back past the bowler, positive
//! towards the batter's leg side, in `(-180, 180]`.

use crease_models::{Decision, EventMarkers, Position, ShotOutcome, ShotTiming, Trajectory, WagonZone};

use crate::classify::BatterHand;
use crate::config::ShotConfig;
use crate::math::angle_between_deg;

/// Post/pre contact speed ratios for (six, four) per direction.
const STRAIGHT_RATIOS: (f64, f64) = (2.8, 1.7);
const OFF_SIDE_RATIOS: (f64, f64) = (2.4, 1.8);
const LEG_SIDE_RATIOS: (f64, f64) = (2.2, 1.5);

/// Upper bearing bound of each zone, off side to leg side. Anything finer
/// than the last bound is fine leg.
const WAGON_ZONES: [(f64, WagonZone); 8] = [
    (-110.0, WagonZone::ThirdMan),
    (-80.0, WagonZone::Point),
    (-40.0, WagonZone::Cover),
    (-10.0, WagonZone::LongOff),
    (10.0, WagonZone::Straight),
    (40.0, WagonZone::LongOn),
    (70.0, WagonZone::Midwicket),
    (100.0, WagonZone::SquareLeg),
];

/// Timing score when the incoming pace is unknown.
const UNKNOWN_PACE_TIMING: f64 = 40.0;
/// Average score needed for 5, 4, 3 and 2 stars.
const RATING_STEPS: [(f64, u8); 4] = [(90.0, 5), (75.0, 4), (55.0, 3), (35.0, 2)];

/// Everything inferred about the stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotAnalysis {
    pub outcome: ShotOutcome,
    pub wagon_zone: Option<WagonZone>,
    pub exit_bearing_deg: Option<f64>,
    pub timing: Option<ShotTiming>,
}

/// Geometry of the ball around the contact point.
#[derive(Debug, Clone, Copy)]
struct Stroke {
    /// Post-contact path length over frame width.
    travel: f64,
    /// Angle between the incoming and outgoing directions.
    deflection_deg: f64,
    bearing_deg: Option<f64>,
    leg_side: bool,
    /// Outgoing over incoming pace; `None` when the incoming pace is zero.
    pace_ratio: Option<f64>,
}

impl Stroke {
    fn measure(trajectory: &Trajectory, c: usize, batter: BatterHand) -> Self {
        let points = &trajectory.smoothed;
        let width = trajectory.frame_size.width_f().max(1.0);
        let travel = points[c..].windows(2).map(|w| w[0].distance(&w[1])).sum::<f64>() / width;

        let (before, at, next, last) = (&points[c - 1], &points[c], &points[c + 1], &points[points.len() - 1]);
        let back = (before.x - at.x, before.y - at.y);
        let out = (last.x - at.x, last.y - at.y);

        let leg = out.0 * batter.sign();
        let bearing_deg = (out.0.hypot(out.1) > f64::EPSILON).then(|| leg.atan2(-out.1).to_degrees());

        let speed = |a: &Position, b: &Position| a.distance(b) / b.frame.saturating_sub(a.frame).max(1) as f64;
        let incoming = speed(before, at);

        Self {
            travel,
            deflection_deg: angle_between_deg(back, out),
            bearing_deg,
            leg_side: leg >= 0.0,
            pace_ratio: (incoming > 0.0).then(|| speed(at, next) / incoming),
        }
    }
}

pub fn analyze_shot(
    trajectory: &Trajectory,
    markers: &EventMarkers,
    batter: BatterHand,
    decision: Option<Decision>,
    config: &ShotConfig,
) -> ShotAnalysis {
    let out = decision == Some(Decision::Out);
    let contact = markers.contact.filter(|&c| c > 0 && c + 1 < trajectory.smoothed.len());

    let Some(c) = contact else {
        return ShotAnalysis {
            outcome: if out { ShotOutcome::Wicket } else { ShotOutcome::Dot },
            wagon_zone: None,
            exit_bearing_deg: None,
            timing: None,
        };
    };

    let stroke = Stroke::measure(trajectory, c, batter);
    let outcome = if out {
        ShotOutcome::Wicket
    } else {
        outcome_from(&stroke, config)
    };

    ShotAnalysis {
        outcome,
        wagon_zone: stroke.bearing_deg.map(wagon_zone),
        exit_bearing_deg: stroke.bearing_deg,
        timing: Some(shot_timing(&stroke, config)),
    }
}

pub fn classify_shot(
    trajectory: &Trajectory,
    markers: &EventMarkers,
    batter: BatterHand,
    decision: Option<Decision>,
    config: &ShotConfig,
) -> ShotOutcome {
    analyze_shot(trajectory, markers, batter, decision, config).outcome
}

fn outcome_from(stroke: &Stroke, config: &ShotConfig) -> ShotOutcome {
    let travel = stroke.travel;
    if travel > config.six_distance {
        return ShotOutcome::Six;
    }
    if travel > config.four_distance {
        return ShotOutcome::Four;
    }
    if travel > config.two_distance {
        return ShotOutcome::Two;
    }
    if travel > config.single_distance {
        return ShotOutcome::Single;
    }

    // short visible travel: judge by direction and how hard it came off the bat
    let ratio = stroke.pace_ratio.unwrap_or(0.0);
    let angle = stroke.deflection_deg;
    let by_ratio = |(six, four): (f64, f64), otherwise| {
        if ratio >= six {
            ShotOutcome::Six
        } else if ratio >= four {
            ShotOutcome::Four
        } else {
            otherwise
        }
    };

    if angle <= config.straight_deg {
        by_ratio(STRAIGHT_RATIOS, ShotOutcome::Dot)
    } else if !stroke.leg_side && angle <= config.off_side_max_deg {
        by_ratio(OFF_SIDE_RATIOS, ShotOutcome::Single)
    } else if stroke.leg_side && angle <= config.leg_side_max_deg {
        by_ratio(LEG_SIDE_RATIOS, ShotOutcome::Single)
    } else {
        ShotOutcome::Dot
    }
}

pub fn wagon_zone(bearing_deg: f64) -> WagonZone {
    WAGON_ZONES
        .iter()
        .find(|(bound, _)| bearing_deg <= *bound)
        .map(|(_, zone)| *zone)
        .unwrap_or(WagonZone::FineLeg)
}

/// Timing peaks when the ball leaves at about twice its incoming pace.
/// Power blends exit pace with carry, where carry to the six distance scores 100.
fn shot_timing(stroke: &Stroke, config: &ShotConfig) -> ShotTiming {
    let timing_score = match stroke.pace_ratio {
        None => UNKNOWN_PACE_TIMING,
        Some(r) if r < 1.0 => 20.0 + 20.0 * r,
        Some(r) if r < 2.0 => 50.0 + 40.0 * (r - 1.0),
        Some(r) => (90.0 + 5.0 * (r - 2.0)).min(100.0),
    };

    let pace = (50.0 * stroke.pace_ratio.unwrap_or(0.0)).min(100.0);
    let carry = (100.0 * stroke.travel / config.six_distance.max(f64::EPSILON)).min(100.0);
    let power_score = (0.5 * pace + 0.5 * carry).clamp(0.0, 100.0);

    let average = (timing_score + power_score) / 2.0;
    let rating = RATING_STEPS
        .iter()
        .find(|(min, _)| average >= *min)
        .map(|(_, stars)| *stars)
        .unwrap_or(1);

    ShotTiming {
        timing_score,
        power_score,
        rating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crease_models::FrameSize;

    /// Ball comes down the screen at 10 px/frame, contact at index 5, then
    /// leaves along `(dx, dy)` per frame for `after` frames.
    fn struck(dx: f64, dy: f64, after: u32) -> (Trajectory, EventMarkers) {
        let mut points: Vec<Position> = (0..=5).map(|i| Position::new(500.0, 100.0 + 10.0 * i as f64, i)).collect();
        for k in 1..=after {
            points.push(Position::new(500.0 + dx * k as f64, 150.0 + dy * k as f64, 5 + k));
        }
        let trajectory = Trajectory {
            cleaned: points.clone(),
            smoothed: points,
            fps: 30.0,
            frame_size: FrameSize::new(1000, 1000),
        };
        let markers = EventMarkers {
            release: Some(0),
            bounce: None,
            contact: Some(5),
        };
        (trajectory, markers)
    }

    fn classify(traj: &Trajectory, markers: &EventMarkers, decision: Option<Decision>) -> ShotOutcome {
        classify_shot(traj, markers, BatterHand::Right, decision, &ShotConfig::default())
    }

    #[test]
    fn test_out_is_wicket() {
        let (traj, markers) = struck(0.0, -40.0, 20);
        assert_eq!(classify(&traj, &markers, Some(Decision::Out)), ShotOutcome::Wicket);
    }

    #[test]
    fn test_no_contact_is_dot() {
        let (traj, mut markers) = struck(0.0, -40.0, 20);
        markers.contact = None;
        assert_eq!(classify(&traj, &markers, Some(Decision::NotOut)), ShotOutcome::Dot);
    }

    #[test]
    fn test_distance_buckets() {
        // 40 px/frame for n frames in a 1000 px wide frame
        for (frames, expected) in [
            (14, ShotOutcome::Six),
            (9, ShotOutcome::Four),
            (5, ShotOutcome::Two),
            (3, ShotOutcome::Single),
        ] {
            let (traj, markers) = struck(0.0, -40.0, frames);
            assert_eq!(classify(&traj, &markers, None), expected, "{frames} frames");
        }
    }

    fn analyze(traj: &Trajectory, markers: &EventMarkers) -> ShotAnalysis {
        analyze_shot(traj, markers, BatterHand::Right, None, &ShotConfig::default())
    }

    #[test]
    fn test_wagon_zones_by_direction() {
        let cases = [
            ((0.0, -40.0), WagonZone::Straight),
            ((12.0, 0.0), WagonZone::SquareLeg),
            ((-20.0, -20.0), WagonZone::Cover),
            ((-30.0, 30.0), WagonZone::ThirdMan),
            ((10.0, 30.0), WagonZone::FineLeg),
            ((-10.0, -40.0), WagonZone::LongOff),
        ];
        for ((dx, dy), expected) in cases {
            let (traj, markers) = struck(dx, dy, 3);
            assert_eq!(analyze(&traj, &markers).wagon_zone, Some(expected), "({dx}, {dy})");
        }

        // a left-hander's leg side is screen left
        let (traj, markers) = struck(-12.0, 0.0, 2);
        let left = analyze_shot(&traj, &markers, BatterHand::Left, None, &ShotConfig::default());
        assert_eq!(left.wagon_zone, Some(WagonZone::SquareLeg));
        assert!((left.exit_bearing_deg.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_zone_boundaries() {
        assert_eq!(wagon_zone(10.0), WagonZone::Straight);
        assert_eq!(wagon_zone(10.5), WagonZone::LongOn);
        assert_eq!(wagon_zone(-180.0), WagonZone::ThirdMan);
        assert_eq!(wagon_zone(180.0), WagonZone::FineLeg);
    }

    #[test]
    fn test_timing_and_power() {
        // lofted straight: four times the incoming pace, carrying past the six distance
        let (traj, markers) = struck(0.0, -40.0, 14);
        let timing = analyze(&traj, &markers).timing.unwrap();
        assert_eq!(timing.timing_score, 100.0);
        assert_eq!(timing.power_score, 100.0);
        assert_eq!(timing.rating, 5);

        // nudged square: 1.2x pace, 24 px of travel
        let (traj, markers) = struck(12.0, 0.0, 2);
        let timing = analyze(&traj, &markers).timing.unwrap();
        assert!((timing.timing_score - 58.0).abs() < 1e-9);
        let expected_power = 0.5 * 60.0 + 0.5 * (100.0 * 0.024 / 0.53);
        assert!((timing.power_score - expected_power).abs() < 1e-9);
        assert_eq!(timing.rating, 2);
    }

    #[test]
    fn test_no_contact_has_no_zone_or_timing() {
        let (traj, mut markers) = struck(0.0, -40.0, 20);
        markers.contact = None;
        let shot = analyze(&traj, &markers);
        assert_eq!(shot.outcome, ShotOutcome::Dot);
        assert!(shot.wagon_zone.is_none() && shot.exit_bearing_deg.is_none() && shot.timing.is_none());
    }

    #[test]
    fn test_short_travel_uses_direction_and_pace() {
        // straight back past the bowler, three times the incoming pace
        let (traj, markers) = struck(0.0, -30.0, 2);
        assert_eq!(classify(&traj, &markers, None), ShotOutcome::Six);

        // square on the leg side, gently
        let (traj, markers) = struck(12.0, 0.0, 2);
        assert_eq!(classify(&traj, &markers, None), ShotOutcome::Single);

        // blocked dead
        let (traj, markers) = struck(0.0, -2.0, 2);
        assert_eq!(classify(&traj, &markers, None), ShotOutcome::Dot);
    }
}
