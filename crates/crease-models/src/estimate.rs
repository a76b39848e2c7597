//! Physical estimates derived from a trajectory.
//!
//! Every estimate carries a [`Provenance`] describing how it was derived.
//! Missing evidence is represented explicitly ([`SpeedOutcome::Unavailable`],
//! [`SwingType::Unknown`]) rather than by a placeholder number.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How an estimate was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Pixel travel converted through a pitch-plane homography.
    PitchHomography,
    /// Pixel travel converted with an assumed release-to-bounce distance.
    EmpiricalScale,
    /// Whole-trajectory average used after the windowed estimate was rejected.
    CoarseAverage,
    /// Coefficients of per-segment quadratic fits.
    QuadraticFit,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::PitchHomography => "pitch_homography",
            Provenance::EmpiricalScale => "empirical_scale",
            Provenance::CoarseAverage => "coarse_average",
            Provenance::QuadraticFit => "quadratic_fit",
        }
    }
}

/// A speed reading in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpeedEstimate {
    pub kmph: f64,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub provenance: Provenance,
    /// True when the value came from a fallback or was clamped into range.
    pub degraded: bool,
}

/// Why no speed could be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeedUnavailable {
    TooFewPoints,
    InvalidFps,
    NoDisplacement,
    OutOfRange,
}

/// Result of the speed estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpeedOutcome {
    Measured(SpeedEstimate),
    Unavailable { reason: SpeedUnavailable },
}

impl SpeedOutcome {
    pub fn estimate(&self) -> Option<&SpeedEstimate> {
        match self {
            SpeedOutcome::Measured(e) => Some(e),
            SpeedOutcome::Unavailable { .. } => None,
        }
    }

    pub fn kmph(&self) -> Option<f64> {
        self.estimate().map(|e| e.kmph)
    }
}

/// Pre-bounce lateral movement category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SwingType {
    Inswing,
    Outswing,
    Straight,
    Unknown,
}

impl SwingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwingType::Inswing => "inswing",
            SwingType::Outswing => "outswing",
            SwingType::Straight => "straight",
            SwingType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwingEstimate {
    pub swing: SwingType,
    /// Signed deviation angle. Positive follows the batter-relative inswing direction.
    pub degrees: Option<f64>,
    pub confidence: f64,
    pub provenance: Provenance,
}

/// Post-bounce change in lateral movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpinType {
    LegSpin,
    OffSpin,
    #[serde(rename = "none")]
    NoSpin,
}

impl SpinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinType::LegSpin => "leg_spin",
            SpinType::OffSpin => "off_spin",
            SpinType::NoSpin => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpinEstimate {
    pub spin: SpinType,
    pub degrees: Option<f64>,
    pub confidence: f64,
    pub provenance: Provenance,
}
