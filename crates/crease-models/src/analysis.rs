//! Per-delivery analysis result and boundary codes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::estimate::{Provenance, SpeedUnavailable, SpinType, SwingType};
use crate::position::{NormalizedPoint, Position};
use crate::trajectory::InsufficientReason;
use crate::verdict::{DrsDecision, EdgeVerdict, ImpactVerdict, ShotOutcome, ShotTiming, StumpProjection, WagonZone};

/// Codes surfaced at the pipeline boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundaryCode {
    InsufficientFrames,
    BallNotDetected,
    TrackingFailed,
    InvalidVideo,
    Unauthenticated,
    QuotaExceeded,
    PremiumRequired,
    PlanExpired,
    ServiceUnavailable,
    Timeout,
    Internal,
}

impl BoundaryCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryCode::InsufficientFrames => "INSUFFICIENT_FRAMES",
            BoundaryCode::BallNotDetected => "BALL_NOT_DETECTED",
            BoundaryCode::TrackingFailed => "TRACKING_FAILED",
            BoundaryCode::InvalidVideo => "INVALID_VIDEO",
            BoundaryCode::Unauthenticated => "UNAUTHENTICATED",
            BoundaryCode::QuotaExceeded => "QUOTA_EXCEEDED",
            BoundaryCode::PremiumRequired => "PREMIUM_REQUIRED",
            BoundaryCode::PlanExpired => "PLAN_EXPIRED",
            BoundaryCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            BoundaryCode::Timeout => "TIMEOUT",
            BoundaryCode::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for BoundaryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Trajectory built and every stage ran.
    Complete,
    /// No ball positions at all.
    BallNotDetected,
    /// Positions were found but no usable trajectory could be built.
    TrackingFailed,
}

impl AnalysisStatus {
    /// Boundary code for non-complete runs.
    pub fn boundary_code(&self) -> Option<BoundaryCode> {
        match self {
            AnalysisStatus::Complete => None,
            AnalysisStatus::BallNotDetected => Some(BoundaryCode::BallNotDetected),
            AnalysisStatus::TrackingFailed => Some(BoundaryCode::TrackingFailed),
        }
    }
}

/// Acoustic transient evidence for one delivery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioSpike {
    pub present: bool,
    /// Normalized spike strength in `[0, 1]`.
    pub strength: f64,
    /// Start times of flagged windows, in milliseconds.
    #[serde(default)]
    pub times_ms: Vec<f64>,
}

impl AudioSpike {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_strength(strength: f64) -> Self {
        let strength = strength.clamp(0.0, 1.0);
        Self {
            present: strength > 0.0,
            strength,
            times_ms: Vec::new(),
        }
    }
}

/// Structured result for one delivery.
///
/// Numeric fields are `None` whenever the evidence behind them is
/// insufficient. They are never zero-filled or sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeliveryAnalysis {
    pub status: AnalysisStatus,
    pub insufficient_reason: Option<InsufficientReason>,

    pub speed_kmph: Option<f64>,
    pub speed_confidence: Option<f64>,
    pub speed_provenance: Option<Provenance>,
    #[serde(default)]
    pub speed_degraded: bool,
    pub speed_unavailable: Option<SpeedUnavailable>,

    pub swing: Option<SwingType>,
    pub swing_degrees: Option<f64>,
    pub spin: Option<SpinType>,
    pub spin_degrees: Option<f64>,
    pub spin_confidence: Option<f64>,

    pub trajectory: Vec<Position>,
    pub release_point: Option<Position>,
    pub bounce_point: Option<Position>,
    pub contact_frame: Option<u32>,
    pub pitch_map: Option<NormalizedPoint>,
    pub release_map: Option<NormalizedPoint>,

    pub impact: Option<ImpactVerdict>,
    pub edge: Option<EdgeVerdict>,
    pub stumps: Option<StumpProjection>,
    pub shot: Option<ShotOutcome>,
    pub wagon_zone: Option<WagonZone>,
    /// Exit direction in degrees: 0 straight back, positive towards leg side.
    pub exit_bearing_deg: Option<f64>,
    pub shot_timing: Option<ShotTiming>,
    pub audio: Option<AudioSpike>,

    pub drs: Option<DrsDecision>,
}

impl DeliveryAnalysis {
    /// An all-null result for a run that stopped early.
    pub fn insufficient(
        status: AnalysisStatus,
        reason: Option<InsufficientReason>,
        trajectory: Vec<Position>,
    ) -> Self {
        Self {
            status,
            insufficient_reason: reason,
            speed_kmph: None,
            speed_confidence: None,
            speed_provenance: None,
            speed_degraded: false,
            speed_unavailable: None,
            swing: None,
            swing_degrees: None,
            spin: None,
            spin_degrees: None,
            spin_confidence: None,
            trajectory,
            release_point: None,
            bounce_point: None,
            contact_frame: None,
            pitch_map: None,
            release_map: None,
            impact: None,
            edge: None,
            stumps: None,
            shot: None,
            wagon_zone: None,
            exit_bearing_deg: None,
            shot_timing: None,
            audio: None,
            drs: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_result_serializes_nulls() {
        let analysis = DeliveryAnalysis::insufficient(AnalysisStatus::BallNotDetected, None, vec![]);
        let json = serde_json::to_value(&analysis).unwrap();

        assert_eq!(json["status"], "BALL_NOT_DETECTED");
        assert!(json["speed_kmph"].is_null());
        assert!(json["swing"].is_null());
        assert!(json["drs"].is_null());
        assert!(json["wagon_zone"].is_null() && json["shot_timing"].is_null());
        assert_eq!(json["trajectory"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_status_boundary_codes() {
        assert_eq!(AnalysisStatus::Complete.boundary_code(), None);
        assert_eq!(
            AnalysisStatus::TrackingFailed.boundary_code(),
            Some(BoundaryCode::TrackingFailed)
        );
        assert_eq!(BoundaryCode::PlanExpired.to_string(), "PLAN_EXPIRED");
    }

    #[test]
    fn test_audio_spike_strength_clamped() {
        let spike = AudioSpike::with_strength(1.7);
        assert!(spike.present);
        assert_eq!(spike.strength, 1.0);
        assert!(!AudioSpike::with_strength(0.0).present);
    }
}
