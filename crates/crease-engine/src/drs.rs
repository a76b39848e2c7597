//! The DRS decision engine.
//!
//! Bat contact always protects the batter. Otherwise the stump confidence
//! decides: at or above the out threshold is OUT, between the umpire's call
//! threshold and the out threshold is UMPIRES_CALL, below that NOT_OUT.

use crease_models::{Decision, DrsDecision, EdgeVerdict, StumpProjection};

use crate::config::DrsConfig;

pub fn decide(edge: &EdgeVerdict, stumps: &StumpProjection, config: &DrsConfig) -> DrsDecision {
    let edge_detected = edge.is_bat();
    let stumps_hit = stumps.direct_hit || stumps.confidence >= config.out_threshold;

    let (decision, reason) = if edge_detected {
        (Decision::NotOut, "bat/pad contact detected")
    } else if stumps_hit {
        (Decision::Out, "ball projected to hit stumps")
    } else if stumps.confidence >= config.umpires_call_threshold {
        (Decision::UmpiresCall, "marginal stump projection")
    } else if stumps.confidence > 0.0 {
        (Decision::NotOut, "missing stumps")
    } else {
        (Decision::NotOut, "no contact, no hit")
    };

    DrsDecision {
        decision,
        reason: reason.to_string(),
        edge_detected,
        stumps_hit,
        stump_confidence: stumps.confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crease_models::{EdgeResult, EdgeRule};

    fn stumps(confidence: f64) -> StumpProjection {
        StumpProjection {
            confidence,
            ..StumpProjection::empty()
        }
    }

    fn bat() -> EdgeVerdict {
        EdgeVerdict {
            result: EdgeResult::Bat,
            confidence: 0.9,
            rule: Some(EdgeRule::StrongSpike),
        }
    }

    #[test]
    fn test_thresholds() {
        let cfg = DrsConfig::default();
        let none = EdgeVerdict::no_contact();

        assert_eq!(decide(&none, &stumps(0.7), &cfg).decision, Decision::Out);
        assert_eq!(decide(&none, &stumps(0.69), &cfg).decision, Decision::UmpiresCall);
        assert_eq!(decide(&none, &stumps(0.4), &cfg).decision, Decision::UmpiresCall);

        let missing = decide(&none, &stumps(0.39), &cfg);
        assert_eq!(missing.decision, Decision::NotOut);
        assert_eq!(missing.reason, "missing stumps");

        let clean = decide(&none, &stumps(0.0), &cfg);
        assert_eq!(clean.reason, "no contact, no hit");
        assert!(!clean.stumps_hit);
    }

    #[test]
    fn test_edge_overrides_stumps() {
        let drs = decide(&bat(), &stumps(1.0), &DrsConfig::default());
        assert_eq!(drs.decision, Decision::NotOut);
        assert!(drs.edge_detected);
        assert!(drs.stumps_hit);
        assert_eq!(drs.reason, "bat/pad contact detected");
    }

    #[test]
    fn test_direct_hit_is_out() {
        let projection = StumpProjection {
            direct_hit: true,
            confidence: 1.0,
            ..StumpProjection::empty()
        };
        let drs = decide(&EdgeVerdict::no_contact(), &projection, &DrsConfig::default());
        assert_eq!(drs.decision, Decision::Out);
    }
}
