//! End-to-end delivery analysis.
//!
//! Positions go through the trajectory builder once; every estimator and
//! verdict reads from the same built trajectory. When the trajectory cannot
//! be built, nothing downstream runs and every physical field is `None`.

use tracing::{debug, info};

use crease_models::{
    normalize_positions, AnalysisStatus, AudioSpike, DeliveryAnalysis, EdgeVerdict, EventMarkers, FrameSize,
    Position, RawPosition, SpeedOutcome,
};

use crate::calibration::PitchCalibration;
use crate::classify::{classify_spin, classify_swing, BatterHand, CameraOrientation};
use crate::config::EngineConfig;
use crate::drs::decide;
use crate::edge::{fuse_edge, passes_through, EdgeSignal};
use crate::impact::classify_impact;
use crate::shot::analyze_shot;
use crate::speed::estimate_speed;
use crate::stumps::project_stumps;
use crate::trajectory::{build_trajectory, TrajectoryOutcome};

/// Everything known about one delivery before analysis.
#[derive(Debug, Clone)]
pub struct DeliveryInput {
    pub positions: Vec<Position>,
    pub fps: f64,
    pub frame_size: FrameSize,
    pub orientation: CameraOrientation,
    pub batter: BatterHand,
    pub calibration: Option<PitchCalibration>,
    pub audio: Option<AudioSpike>,
    /// Set when a direct hit on the stumps was observed independently.
    pub direct_stump_hit: bool,
}

impl DeliveryInput {
    pub fn new(positions: Vec<Position>, fps: f64, frame_size: FrameSize) -> Self {
        Self {
            positions,
            fps,
            frame_size,
            orientation: CameraOrientation::Standard,
            batter: BatterHand::Right,
            calibration: None,
            audio: None,
            direct_stump_hit: false,
        }
    }

    /// Build from loosely-shaped positions, normalizing them first.
    pub fn from_raw(raw: Vec<RawPosition>, fps: f64, frame_size: FrameSize) -> Self {
        Self::new(normalize_positions(raw), fps, frame_size)
    }

    pub fn with_orientation(mut self, orientation: CameraOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_batter(mut self, batter: BatterHand) -> Self {
        self.batter = batter;
        self
    }

    pub fn with_calibration(mut self, calibration: PitchCalibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn with_audio(mut self, audio: AudioSpike) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_direct_stump_hit(mut self, hit: bool) -> Self {
        self.direct_stump_hit = hit;
        self
    }
}

pub fn analyze_delivery(input: &DeliveryInput, config: &EngineConfig) -> DeliveryAnalysis {
    if input.positions.is_empty() {
        info!("No ball positions, skipping analysis");
        return DeliveryAnalysis {
            audio: input.audio.clone(),
            ..DeliveryAnalysis::insufficient(AnalysisStatus::BallNotDetected, None, Vec::new())
        };
    }

    let positions = input.orientation.unmirror(&input.positions, input.frame_size);
    let built = match build_trajectory(&positions, input.fps, input.frame_size, &config.trajectory) {
        TrajectoryOutcome::Built(built) => built,
        TrajectoryOutcome::Insufficient { reason, cleaned } => {
            info!(reason = %reason, points = cleaned.len(), "Tracking insufficient for analysis");
            return DeliveryAnalysis {
                audio: input.audio.clone(),
                ..DeliveryAnalysis::insufficient(AnalysisStatus::TrackingFailed, Some(reason), cleaned)
            };
        }
    };

    let trajectory = &built.trajectory;
    let markers = &built.markers;
    let size = input.frame_size;

    let speed = estimate_speed(trajectory, markers, input.calibration.as_ref(), &config.speed);
    let swing = classify_swing(&built.pre_bounce, size, input.batter, &config.classifier);
    let spin = classify_spin(&built.pre_bounce, &built.post_bounce, size, input.batter, &config.classifier);

    let signal = EdgeSignal::measure(trajectory, markers.contact, config.edge.measure_steps, input.audio.clone());
    let near_bat = passes_through(&trajectory.cleaned, size, &config.edge.bat_zone);
    let edge = if near_bat {
        fuse_edge(&signal, &config.edge)
    } else {
        EdgeVerdict::no_contact()
    };
    debug!(
        near_bat,
        deviation_deg = signal.deviation_deg,
        speed_ratio = signal.speed_ratio,
        edge = ?edge.result,
        "Edge evaluated"
    );

    let bounce_frame = EventMarkers::point(trajectory, markers.bounce).map(|p| p.frame);
    let stumps = project_stumps(
        &trajectory.cleaned,
        &positions,
        bounce_frame,
        size,
        input.direct_stump_hit,
        &config.stumps,
    );
    let drs = decide(&edge, &stumps, &config.drs);
    let impact = classify_impact(
        &edge,
        &signal,
        markers.contact.is_some(),
        &stumps,
        &config.edge,
        &config.drs,
    );
    let shot = analyze_shot(trajectory, markers, input.batter, Some(drs.decision), &config.shot);

    let release_point = EventMarkers::point(trajectory, markers.release);
    let bounce_point = EventMarkers::point(trajectory, markers.bounce);
    let contact_frame = EventMarkers::point(trajectory, markers.contact).map(|p| p.frame);

    info!(
        points = trajectory.len(),
        speed_kmph = ?speed.kmph(),
        swing = swing.swing.as_str(),
        spin = spin.spin.as_str(),
        edge = edge.is_bat(),
        stump_confidence = stumps.confidence,
        decision = %drs.decision,
        "Delivery analysed"
    );

    let (speed_kmph, speed_confidence, speed_provenance, speed_degraded, speed_unavailable) = match speed {
        SpeedOutcome::Measured(e) => (Some(e.kmph), Some(e.confidence), Some(e.provenance), e.degraded, None),
        SpeedOutcome::Unavailable { reason } => (None, None, None, false, Some(reason)),
    };

    DeliveryAnalysis {
        status: AnalysisStatus::Complete,
        insufficient_reason: None,
        speed_kmph,
        speed_confidence,
        speed_provenance,
        speed_degraded,
        speed_unavailable,
        swing: Some(swing.swing),
        swing_degrees: swing.degrees,
        spin: Some(spin.spin),
        spin_degrees: spin.degrees,
        spin_confidence: Some(spin.confidence),
        trajectory: trajectory.cleaned.clone(),
        release_point,
        bounce_point,
        contact_frame,
        pitch_map: bounce_point.map(|p| p.normalized(size)),
        release_map: release_point.map(|p| p.normalized(size)),
        impact: Some(impact),
        edge: Some(edge),
        stumps: Some(stumps),
        shot: Some(shot.outcome),
        wagon_zone: shot.wagon_zone,
        exit_bearing_deg: shot.exit_bearing_deg,
        shot_timing: shot.timing,
        audio: input.audio.clone(),
        drs: Some(drs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crease_models::{InsufficientReason, SpinType, SwingType};

    fn size() -> FrameSize {
        FrameSize::new(1280, 720)
    }

    /// Bounce at frame 30, x curving toward screen right throughout.
    fn curving() -> Vec<Position> {
        (0..60u32)
            .map(|i| {
                let f = i as f64;
                let y = if i <= 30 { 100.0 + 6.0 * f } else { 280.0 - 5.0 * (f - 30.0) };
                Position::new(300.0 + 2.0 * f + 0.1 * f * f, y, i)
            })
            .collect()
    }

    #[test]
    fn test_no_positions_is_ball_not_detected() {
        let input = DeliveryInput::new(Vec::new(), 30.0, size());
        let analysis = analyze_delivery(&input, &EngineConfig::default());
        assert_eq!(analysis.status, AnalysisStatus::BallNotDetected);
        assert!(analysis.drs.is_none());
        assert!(analysis.speed_kmph.is_none());
    }

    #[test]
    fn test_short_track_is_tracking_failed() {
        let positions = curving().into_iter().take(4).collect();
        let input = DeliveryInput::new(positions, 60.0, size()).with_audio(AudioSpike::with_strength(0.5));
        let analysis = analyze_delivery(&input, &EngineConfig::default());

        assert_eq!(analysis.status, AnalysisStatus::TrackingFailed);
        assert_eq!(analysis.insufficient_reason, Some(InsufficientReason::TooFewPoints));
        assert!(analysis.drs.is_none());
        assert!(analysis.swing.is_none());
        assert_eq!(analysis.trajectory.len(), 4);
        assert!(analysis.audio.is_some());
    }

    #[test]
    fn test_swing_direction_survives_mirroring() {
        let config = EngineConfig::default();

        let standard = analyze_delivery(&DeliveryInput::new(curving(), 60.0, size()), &config);
        assert_eq!(standard.swing, Some(SwingType::Inswing));
        assert_eq!(standard.spin, Some(SpinType::NoSpin));

        let mirrored: Vec<Position> = curving()
            .into_iter()
            .map(|p| Position::new(1280.0 - p.x, p.y, p.frame))
            .collect();
        let input = DeliveryInput::new(mirrored, 60.0, size()).with_orientation(CameraOrientation::Mirrored);
        assert_eq!(analyze_delivery(&input, &config).swing, Some(SwingType::Inswing));

        let lefty = DeliveryInput::new(curving(), 60.0, size()).with_batter(BatterHand::Left);
        assert_eq!(analyze_delivery(&lefty, &config).swing, Some(SwingType::Outswing));
    }

    #[test]
    fn test_complete_analysis_fields() {
        let analysis = analyze_delivery(&DeliveryInput::new(curving(), 60.0, size()), &EngineConfig::default());
        assert!(analysis.is_complete());
        assert_eq!(analysis.bounce_point.map(|p| p.frame), Some(30));
        assert_eq!(analysis.release_point.map(|p| p.frame), Some(0));
        assert!(analysis.pitch_map.is_some());
        assert!(analysis.drs.is_some());

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["status"], "COMPLETE");
    }
}
