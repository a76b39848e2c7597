//! Edge detection: fuse the trajectory's deflection at contact with the
//! acoustic spike.
//!
//! Rules are evaluated in a fixed order and the first match wins. Edge
//! detection only runs when the ball actually passed through the bat zone.

use crease_models::{AudioSpike, EdgeResult, EdgeRule, EdgeVerdict, FrameSize, Position, Trajectory};

use crate::config::{EdgeConfig, Zone};
use crate::math::angle_between_deg;

/// Vision and audio evidence for one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSignal {
    /// Direction change at contact, degrees in `[0, 180]`.
    pub deviation_deg: f64,
    /// Speed just after contact over speed just before.
    pub speed_ratio: f64,
    pub audio: Option<AudioSpike>,
}

impl EdgeSignal {
    /// No deflection, no slowdown.
    pub fn neutral(audio: Option<AudioSpike>) -> Self {
        Self {
            deviation_deg: 0.0,
            speed_ratio: 1.0,
            audio,
        }
    }

    /// Measure the deflection at `contact` using up to `steps` points either side.
    pub fn measure(
        trajectory: &Trajectory,
        contact: Option<usize>,
        steps: usize,
        audio: Option<AudioSpike>,
    ) -> Self {
        let points = &trajectory.smoothed;
        let Some(c) = contact.filter(|&c| c < points.len()) else {
            return Self::neutral(audio);
        };

        let before = steps.min(c);
        let after = steps.min(points.len() - 1 - c);
        if before == 0 || after == 0 {
            return Self::neutral(audio);
        }

        let (a, p, b) = (&points[c - before], &points[c], &points[c + after]);
        let pre = (p.x - a.x, p.y - a.y);
        let post = (b.x - p.x, b.y - p.y);

        let per_frame = |from: &Position, to: &Position| {
            from.distance(to) / to.frame.saturating_sub(from.frame).max(1) as f64
        };
        let pre_speed = per_frame(a, p);
        let speed_ratio = if pre_speed > 0.0 {
            per_frame(p, b) / pre_speed
        } else {
            1.0
        };

        Self {
            deviation_deg: angle_between_deg(pre, post),
            speed_ratio,
            audio,
        }
    }

    fn spike_strength(&self) -> f64 {
        self.audio
            .as_ref()
            .filter(|a| a.present)
            .map(|a| a.strength)
            .unwrap_or(0.0)
    }
}

/// Whether any point falls inside `zone`.
pub fn passes_through(points: &[Position], frame_size: FrameSize, zone: &Zone) -> bool {
    points.iter().any(|p| {
        let n = p.normalized(frame_size);
        zone.contains(n.x, n.y)
    })
}

pub fn fuse_edge(signal: &EdgeSignal, config: &EdgeConfig) -> EdgeVerdict {
    let spike = signal.spike_strength();
    let dev = signal.deviation_deg;
    let ratio = signal.speed_ratio;

    let bat = |confidence: f64, rule| EdgeVerdict {
        result: EdgeResult::Bat,
        confidence: confidence.clamp(0.0, 1.0),
        rule: Some(rule),
    };

    if spike > config.strong_spike && dev > config.strong_deviation_deg && ratio < config.strong_speed_ratio {
        bat((0.6 + spike).min(1.0), EdgeRule::StrongSpike)
    } else if spike > config.moderate_spike
        && dev >= config.moderate_deviation_deg
        && ratio <= config.moderate_speed_ratio
    {
        bat((0.45 + 0.3 * spike).min(0.75), EdgeRule::ModerateSpike)
    } else if spike == 0.0 && dev >= config.vision_deviation_deg && ratio <= config.vision_speed_ratio {
        bat(config.vision_confidence, EdgeRule::VisionOnly)
    } else if spike > 0.0 {
        bat(0.2 + 0.2 * spike, EdgeRule::WeakSpike)
    } else {
        EdgeVerdict::no_contact()
    }
}
