//! Impact, edge, stump and DRS verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactType {
    Bat,
    Pad,
    Stump,
    #[serde(rename = "NONE")]
    NoImpact,
}

/// What the ball hit first, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ImpactVerdict {
    pub impact_type: ImpactType,
    pub confidence: f64,
}

impl ImpactVerdict {
    pub fn none() -> Self {
        Self {
            impact_type: ImpactType::NoImpact,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeResult {
    Bat,
    NoContact,
}

/// Which fusion rule produced a BAT edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRule {
    StrongSpike,
    ModerateSpike,
    VisionOnly,
    WeakSpike,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeVerdict {
    pub result: EdgeResult,
    pub confidence: f64,
    /// Set when `result` is `Bat`.
    pub rule: Option<EdgeRule>,
}

impl EdgeVerdict {
    pub fn no_contact() -> Self {
        Self {
            result: EdgeResult::NoContact,
            confidence: 0.0,
            rule: None,
        }
    }

    pub fn is_bat(&self) -> bool {
        self.result == EdgeResult::Bat
    }
}

/// Stump-zone intersection evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StumpProjection {
    /// Combined confidence that the ball would hit the stumps, `[0, 1]`.
    pub confidence: f64,
    /// Recent points observed inside the stump zone.
    pub zone_hits: usize,
    pub zone_confidence: f64,
    /// Normalized x where the forward projection crosses the stump plane.
    pub projected_x: Option<f64>,
    pub projection_confidence: f64,
    /// Caller-supplied or observed direct hit.
    pub direct_hit: bool,
}

impl StumpProjection {
    pub fn empty() -> Self {
        Self {
            confidence: 0.0,
            zone_hits: 0,
            zone_confidence: 0.0,
            projected_x: None,
            projection_confidence: 0.0,
            direct_hit: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Out,
    NotOut,
    UmpiresCall,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Out => "OUT",
            Decision::NotOut => "NOT_OUT",
            Decision::UmpiresCall => "UMPIRES_CALL",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final adjudication for one delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DrsDecision {
    pub decision: Decision,
    /// Human-readable explanation.
    pub reason: String,
    pub edge_detected: bool,
    pub stumps_hit: bool,
    pub stump_confidence: f64,
}

/// Batting result inferred from post-contact travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ShotOutcome {
    #[serde(rename = "W")]
    Wicket,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "1")]
    Single,
    #[serde(rename = "0")]
    Dot,
}

impl ShotOutcome {
    pub fn runs(&self) -> u8 {
        match self {
            ShotOutcome::Six => 6,
            ShotOutcome::Four => 4,
            ShotOutcome::Two => 2,
            ShotOutcome::Single => 1,
            ShotOutcome::Wicket | ShotOutcome::Dot => 0,
        }
    }
}

/// Fielding region the ball was struck towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WagonZone {
    FineLeg,
    SquareLeg,
    Midwicket,
    LongOn,
    Straight,
    LongOff,
    Cover,
    Point,
    ThirdMan,
}

impl WagonZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            WagonZone::FineLeg => "fine_leg",
            WagonZone::SquareLeg => "square_leg",
            WagonZone::Midwicket => "midwicket",
            WagonZone::LongOn => "long_on",
            WagonZone::Straight => "straight",
            WagonZone::LongOff => "long_off",
            WagonZone::Cover => "cover",
            WagonZone::Point => "point",
            WagonZone::ThirdMan => "third_man",
        }
    }
}

/// How well and how hard the ball was struck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShotTiming {
    /// 0-100, from exit pace relative to incoming pace.
    pub timing_score: f64,
    /// 0-100, from exit pace and carry.
    pub power_score: f64,
    /// 1-5 stars.
    pub rating: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_wire_names() {
        assert_eq!(serde_json::to_string(&Decision::UmpiresCall).unwrap(), "\"UMPIRES_CALL\"");
        assert_eq!(serde_json::to_string(&Decision::NotOut).unwrap(), "\"NOT_OUT\"");
        assert_eq!(Decision::Out.to_string(), "OUT");
    }

    #[test]
    fn test_impact_and_edge_wire_names() {
        assert_eq!(serde_json::to_string(&ImpactType::NoImpact).unwrap(), "\"NONE\"");
        assert_eq!(serde_json::to_string(&EdgeResult::NoContact).unwrap(), "\"NO_CONTACT\"");
        assert_eq!(serde_json::to_string(&ShotOutcome::Wicket).unwrap(), "\"W\"");
        assert_eq!(ShotOutcome::Four.runs(), 4);
        assert_eq!(serde_json::to_string(&WagonZone::ThirdMan).unwrap(), "\"third_man\"");
        assert_eq!(WagonZone::LongOn.as_str(), "long_on");
    }
}
