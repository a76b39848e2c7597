//! First-impact classification: bat, pad, stumps or nothing.

use crease_models::{EdgeVerdict, ImpactType, ImpactVerdict, StumpProjection};

use crate::config::{DrsConfig, EdgeConfig};
use crate::edge::EdgeSignal;

/// Priority is bat, then pad, then stumps.
///
/// A pad hit is a contact with almost no deflection but a heavy slowdown.
pub fn classify_impact(
    edge: &EdgeVerdict,
    signal: &EdgeSignal,
    contact_detected: bool,
    stumps: &StumpProjection,
    edge_config: &EdgeConfig,
    drs_config: &DrsConfig,
) -> ImpactVerdict {
    if edge.is_bat() {
        return ImpactVerdict {
            impact_type: ImpactType::Bat,
            confidence: edge.confidence,
        };
    }

    if contact_detected
        && signal.deviation_deg <= edge_config.pad_max_deviation_deg
        && signal.speed_ratio <= edge_config.pad_max_speed_ratio
    {
        let slowdown = 1.0 - signal.speed_ratio / edge_config.pad_max_speed_ratio.max(f64::EPSILON);
        return ImpactVerdict {
            impact_type: ImpactType::Pad,
            confidence: (0.5 + 0.5 * slowdown).clamp(0.0, 1.0),
        };
    }

    if stumps.direct_hit || stumps.confidence >= drs_config.out_threshold {
        return ImpactVerdict {
            impact_type: ImpactType::Stump,
            confidence: stumps.confidence,
        };
    }

    ImpactVerdict::none()
}
