//! Tuning knobs for every analysis stage.
//!
//! All thresholds are empirical and subject to recalibration, so each one is a
//! named constant feeding a serde-deserializable config with `#[serde(default)]`.
//! A partial config file overrides only the fields it names.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ============================================================================
// Trajectory
// ============================================================================

/// Fewer cleaned positions than this and no estimator runs.
pub const MIN_TRAJECTORY_POINTS: usize = 6;
/// Consecutive positions closer than this (px) are treated as stationary jitter.
pub const JITTER_FLOOR_PX: f64 = 1.5;
pub const SMOOTHING_WINDOW: usize = 3;
/// Each side of the bounce split needs this many points, bounce included.
pub const MIN_SEGMENT_POINTS: usize = 3;
/// Contact when `v[i] / v[i-1]` drops below this.
pub const DECELERATION_RATIO: f64 = 0.6;
/// ...and `v[i-1]` exceeds this fraction of the median step velocity.
pub const CONTACT_MIN_VELOCITY_FRACTION: f64 = 0.5;
pub const MIN_CONTACT_VELOCITIES: usize = 4;

// ============================================================================
// Speed
// ============================================================================

pub const MIN_VALID_SPEED_KMPH: f64 = 54.0;
pub const MAX_VALID_SPEED_KMPH: f64 = 180.0;
/// Early points skipped to avoid hand-separation noise.
pub const RELEASE_SKIP_POINTS: usize = 2;
pub const RELEASE_WINDOW_POINTS: usize = 8;
/// Per-frame step bounds (px) for a step to count toward speed.
pub const MIN_SPEED_STEP_PX: f64 = 1.5;
pub const MAX_SPEED_STEP_PX: f64 = 120.0;
pub const MIN_SPEED_STEPS: usize = 2;
/// Assumed release-to-bounce travel when no calibration is supplied.
pub const RELEASE_TO_BOUNCE_M: f64 = 16.0;
/// Assumed travel for a trajectory with no detected bounce.
pub const FULL_TRAVEL_M: f64 = 20.12;
/// Pixel chord below which no empirical scale is derived.
pub const MIN_SCALE_CHORD_PX: f64 = 20.0;
/// Out-of-range readings within this fraction of the bounds are clamped.
pub const SPEED_CLAMP_TOLERANCE: f64 = 0.15;

// ============================================================================
// Swing / spin
// ============================================================================

/// Angles inside ±this many degrees classify as straight / no spin.
pub const DEAD_ZONE_DEG: f64 = 1.2;
/// Lateral acceleration floor, in frame widths per second squared.
pub const SWING_ACCEL_FLOOR: f64 = 0.02;
pub const SPIN_ACCEL_FLOOR: f64 = 0.03;
/// Fit RMSE (px) at which fit quality halves.
pub const FIT_RMSE_SCALE_PX: f64 = 3.0;
/// Points per segment for full coverage confidence.
pub const FULL_COVERAGE_POINTS: usize = 8;

// ============================================================================
// Edge fusion
// ============================================================================

pub const STRONG_SPIKE: f64 = 0.6;
pub const STRONG_DEVIATION_DEG: f64 = 8.0;
pub const STRONG_SPEED_RATIO: f64 = 0.78;
pub const MODERATE_SPIKE: f64 = 0.22;
pub const MODERATE_DEVIATION_DEG: f64 = 3.0;
pub const MODERATE_SPEED_RATIO: f64 = 0.85;
pub const VISION_DEVIATION_DEG: f64 = 15.0;
pub const VISION_SPEED_RATIO: f64 = 0.7;
pub const VISION_CONFIDENCE: f64 = 0.55;
/// Steps either side of the contact point used to measure deviation.
pub const EDGE_MEASURE_STEPS: usize = 2;
/// Pad impact: little deflection but a heavy slowdown.
pub const PAD_MAX_DEVIATION_DEG: f64 = 3.0;
pub const PAD_MAX_SPEED_RATIO: f64 = 0.6;

// ============================================================================
// Zones and decision
// ============================================================================

/// Normalized stump zone.
pub const STUMP_ZONE: Zone = Zone::new(0.47, 0.53, 0.64, 0.90);
/// Normalized bat-proximity zone.
pub const BAT_ZONE: Zone = Zone::new(0.38, 0.62, 0.25, 0.55);
pub const STUMP_RECENT_POINTS: usize = 5;
pub const STUMP_PROJECTION_POINTS: usize = 4;
/// Lateral residual (normalized) at which projection confidence halves.
pub const LATERAL_VARIANCE_SCALE: f64 = 0.01;
/// Projection confidence falls to zero over this normalized distance.
pub const MAX_PROJECTION_GAP: f64 = 0.5;
pub const OUT_THRESHOLD: f64 = 0.7;
pub const UMPIRES_CALL_THRESHOLD: f64 = 0.4;

// ============================================================================
// Shot outcome (distances in frame widths)
// ============================================================================

pub const SIX_DISTANCE: f64 = 0.53;
pub const FOUR_DISTANCE: f64 = 0.34;
pub const TWO_DISTANCE: f64 = 0.19;
pub const SINGLE_DISTANCE: f64 = 0.094;
pub const STRAIGHT_SHOT_DEG: f64 = 10.0;
pub const OFF_SIDE_MAX_DEG: f64 = 60.0;
pub const LEG_SIDE_MAX_DEG: f64 = 130.0;

/// Axis-aligned rectangle in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Zone {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn center_x(&self) -> f64 {
        (self.x_min + self.x_max) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.y_min + self.y_max) / 2.0
    }

    pub fn half_width(&self) -> f64 {
        (self.x_max - self.x_min) / 2.0
    }

    fn validate(&self, name: &str) -> EngineResult<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(self.x_min < self.x_max && self.y_min < self.y_max)
            || ![self.x_min, self.x_max, self.y_min, self.y_max].into_iter().all(in_unit)
        {
            return Err(EngineError::invalid_config(format!("{name} is not a normalized rectangle")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub min_points: usize,
    pub jitter_floor_px: f64,
    pub smoothing_window: usize,
    pub min_segment_points: usize,
    pub deceleration_ratio: f64,
    pub contact_min_velocity_fraction: f64,
    pub min_contact_velocities: usize,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            min_points: MIN_TRAJECTORY_POINTS,
            jitter_floor_px: JITTER_FLOOR_PX,
            smoothing_window: SMOOTHING_WINDOW,
            min_segment_points: MIN_SEGMENT_POINTS,
            deceleration_ratio: DECELERATION_RATIO,
            contact_min_velocity_fraction: CONTACT_MIN_VELOCITY_FRACTION,
            min_contact_velocities: MIN_CONTACT_VELOCITIES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// Fewer cleaned points than this and no speed is reported.
    pub min_points: usize,
    pub min_valid_kmph: f64,
    pub max_valid_kmph: f64,
    pub release_skip_points: usize,
    pub release_window_points: usize,
    pub min_step_px: f64,
    pub max_step_px: f64,
    pub min_steps: usize,
    pub release_to_bounce_m: f64,
    pub full_travel_m: f64,
    pub min_scale_chord_px: f64,
    pub clamp_tolerance: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            min_points: MIN_TRAJECTORY_POINTS,
            min_valid_kmph: MIN_VALID_SPEED_KMPH,
            max_valid_kmph: MAX_VALID_SPEED_KMPH,
            release_skip_points: RELEASE_SKIP_POINTS,
            release_window_points: RELEASE_WINDOW_POINTS,
            min_step_px: MIN_SPEED_STEP_PX,
            max_step_px: MAX_SPEED_STEP_PX,
            min_steps: MIN_SPEED_STEPS,
            release_to_bounce_m: RELEASE_TO_BOUNCE_M,
            full_travel_m: FULL_TRAVEL_M,
            min_scale_chord_px: MIN_SCALE_CHORD_PX,
            clamp_tolerance: SPEED_CLAMP_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub dead_zone_deg: f64,
    pub swing_accel_floor: f64,
    pub spin_accel_floor: f64,
    pub fit_rmse_scale_px: f64,
    pub full_coverage_points: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dead_zone_deg: DEAD_ZONE_DEG,
            swing_accel_floor: SWING_ACCEL_FLOOR,
            spin_accel_floor: SPIN_ACCEL_FLOOR,
            fit_rmse_scale_px: FIT_RMSE_SCALE_PX,
            full_coverage_points: FULL_COVERAGE_POINTS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub strong_spike: f64,
    pub strong_deviation_deg: f64,
    pub strong_speed_ratio: f64,
    pub moderate_spike: f64,
    pub moderate_deviation_deg: f64,
    pub moderate_speed_ratio: f64,
    pub vision_deviation_deg: f64,
    pub vision_speed_ratio: f64,
    pub vision_confidence: f64,
    pub measure_steps: usize,
    pub pad_max_deviation_deg: f64,
    pub pad_max_speed_ratio: f64,
    pub bat_zone: Zone,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            strong_spike: STRONG_SPIKE,
            strong_deviation_deg: STRONG_DEVIATION_DEG,
            strong_speed_ratio: STRONG_SPEED_RATIO,
            moderate_spike: MODERATE_SPIKE,
            moderate_deviation_deg: MODERATE_DEVIATION_DEG,
            moderate_speed_ratio: MODERATE_SPEED_RATIO,
            vision_deviation_deg: VISION_DEVIATION_DEG,
            vision_speed_ratio: VISION_SPEED_RATIO,
            vision_confidence: VISION_CONFIDENCE,
            measure_steps: EDGE_MEASURE_STEPS,
            pad_max_deviation_deg: PAD_MAX_DEVIATION_DEG,
            pad_max_speed_ratio: PAD_MAX_SPEED_RATIO,
            bat_zone: BAT_ZONE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StumpConfig {
    pub zone: Zone,
    pub recent_points: usize,
    pub projection_points: usize,
    pub lateral_variance_scale: f64,
    pub max_projection_gap: f64,
}

impl Default for StumpConfig {
    fn default() -> Self {
        Self {
            zone: STUMP_ZONE,
            recent_points: STUMP_RECENT_POINTS,
            projection_points: STUMP_PROJECTION_POINTS,
            lateral_variance_scale: LATERAL_VARIANCE_SCALE,
            max_projection_gap: MAX_PROJECTION_GAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrsConfig {
    pub out_threshold: f64,
    pub umpires_call_threshold: f64,
}

impl Default for DrsConfig {
    fn default() -> Self {
        Self {
            out_threshold: OUT_THRESHOLD,
            umpires_call_threshold: UMPIRES_CALL_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotConfig {
    pub six_distance: f64,
    pub four_distance: f64,
    pub two_distance: f64,
    pub single_distance: f64,
    pub straight_deg: f64,
    pub off_side_max_deg: f64,
    pub leg_side_max_deg: f64,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            six_distance: SIX_DISTANCE,
            four_distance: FOUR_DISTANCE,
            two_distance: TWO_DISTANCE,
            single_distance: SINGLE_DISTANCE,
            straight_deg: STRAIGHT_SHOT_DEG,
            off_side_max_deg: OFF_SIDE_MAX_DEG,
            leg_side_max_deg: LEG_SIDE_MAX_DEG,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trajectory: TrajectoryConfig,
    pub speed: SpeedConfig,
    pub classifier: ClassifierConfig,
    pub edge: EdgeConfig,
    pub stumps: StumpConfig,
    pub drs: DrsConfig,
    pub shot: ShotConfig,
}

impl EngineConfig {
    /// Reject configurations that would make stages meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        if self.trajectory.min_points < 2 * self.trajectory.min_segment_points - 1 {
            return Err(EngineError::invalid_config(
                "trajectory.min_points cannot hold two segments",
            ));
        }
        if self.trajectory.smoothing_window == 0 {
            return Err(EngineError::invalid_config("trajectory.smoothing_window must be >= 1"));
        }
        if !(self.speed.min_valid_kmph > 0.0 && self.speed.min_valid_kmph < self.speed.max_valid_kmph) {
            return Err(EngineError::invalid_config("speed range must satisfy 0 < min < max"));
        }
        if !(0.0..=1.0).contains(&self.speed.clamp_tolerance) {
            return Err(EngineError::invalid_config("speed.clamp_tolerance must be in [0, 1]"));
        }
        if !(0.0 < self.drs.umpires_call_threshold && self.drs.umpires_call_threshold < self.drs.out_threshold
            && self.drs.out_threshold <= 1.0)
        {
            return Err(EngineError::invalid_config(
                "drs thresholds must satisfy 0 < umpires_call < out <= 1",
            ));
        }
        self.stumps.zone.validate("stumps.zone")?;
        self.edge.bat_zone.validate("edge.bat_zone")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{"drs": {"out_threshold": 0.8}, "speed": {"max_valid_kmph": 170.0}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.drs.out_threshold, 0.8);
        assert_eq!(config.drs.umpires_call_threshold, UMPIRES_CALL_THRESHOLD);
        assert_eq!(config.speed.max_valid_kmph, 170.0);
        assert_eq!(config.speed.min_valid_kmph, MIN_VALID_SPEED_KMPH);
        assert_eq!(config.stumps.zone, STUMP_ZONE);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = EngineConfig::default();
        config.drs.umpires_call_threshold = 0.9;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.stumps.zone = Zone::new(0.6, 0.4, 0.1, 0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zone_geometry() {
        assert!(STUMP_ZONE.contains(0.5, 0.7));
        assert!(!STUMP_ZONE.contains(0.46, 0.7));
        assert!((STUMP_ZONE.center_x() - 0.5).abs() < 1e-12);
        assert!((STUMP_ZONE.half_width() - 0.03).abs() < 1e-12);
    }
}
