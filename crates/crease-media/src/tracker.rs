//! Greedy nearest-neighbour ball tracker.
//!
//! Picks, per frame, the candidate closest to the last accepted position that
//! still moved more than a minimal floor. There is no multi-hypothesis state
//! and no occlusion recovery beyond skipping frames without a match.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crease_models::Position;

use crate::detection::{BallDetector, Candidate};
use crate::frame::FrameSequence;

/// Candidates closer than this to the last position are static noise or the
/// vacated spot left behind by frame differencing.
pub const DEFAULT_MIN_MOTION_PX: f64 = 2.0;
/// Largest plausible per-frame jump in pixels at 640px width.
pub const DEFAULT_MAX_STEP_PX: f64 = 150.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub min_motion_px: f64,
    /// Scaled by the number of frames since the last accepted position.
    pub max_step_px: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_motion_px: DEFAULT_MIN_MOTION_PX,
            max_step_px: DEFAULT_MAX_STEP_PX,
        }
    }
}

/// Per-clip tracker state. Create one per delivery.
#[derive(Debug, Clone, Default)]
pub struct GreedyBallTracker {
    config: TrackerConfig,
    last: Option<Position>,
}

impl GreedyBallTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config, last: None }
    }

    /// Consider one frame's candidates; returns the accepted position, if any.
    pub fn update(&mut self, frame_index: u32, candidates: &[Candidate]) -> Option<Position> {
        let chosen = match self.last {
            None => candidates
                .iter()
                .max_by(|a, b| a.score.total_cmp(&b.score).then(a.area.total_cmp(&b.area))),
            Some(last) => {
                let gap = frame_index.saturating_sub(last.frame).max(1) as f64;
                let max_step = self.config.max_step_px * gap;
                candidates
                    .iter()
                    .map(|c| (c, c.distance_to(last.x, last.y)))
                    .filter(|(_, d)| *d > self.config.min_motion_px && *d <= max_step)
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(c, _)| c)
            }
        };

        let position = chosen.map(|c| Position::new(c.x, c.y, frame_index))?;
        self.last = Some(position);
        Some(position)
    }

    pub fn last(&self) -> Option<Position> {
        self.last
    }
}

/// Run a detector over every frame and track the ball.
///
/// Returns an empty vector when nothing qualifies; callers treat that as
/// "tracking failed", not as an error.
pub fn track_ball(
    detector: &mut dyn BallDetector,
    frames: &FrameSequence,
    config: &TrackerConfig,
) -> Vec<Position> {
    detector.reset();
    let mut tracker = GreedyBallTracker::new(config.clone());

    let positions: Vec<Position> = frames
        .frames
        .iter()
        .filter_map(|frame| {
            let candidates = detector.detect(frame);
            tracker.update(frame.index, &candidates)
        })
        .collect();

    debug!(
        detector = detector.name(),
        frames = frames.len(),
        positions = positions.len(),
        "Ball tracking complete"
    );

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::imaging::draw_disc;
    use crate::detection::{MotionDetector, ReplayDetector};
    use image::GrayImage;

    #[test]
    fn test_prefers_nearest_moving_candidate() {
        let mut tracker = GreedyBallTracker::default();
        assert!(tracker.update(0, &[Candidate::at(100.0, 100.0)]).is_some());

        // ghost at the old spot, the ball, and a far-away blob
        let candidates = [
            Candidate::at(100.5, 100.0),
            Candidate::at(110.0, 104.0),
            Candidate::at(400.0, 300.0),
        ];
        let p = tracker.update(1, &candidates).unwrap();
        assert_eq!((p.x, p.y, p.frame), (110.0, 104.0, 1));
    }

    #[test]
    fn test_no_match_keeps_last_position() {
        let mut tracker = GreedyBallTracker::default();
        tracker.update(0, &[Candidate::at(10.0, 10.0)]);
        assert!(tracker.update(1, &[Candidate::at(10.5, 10.0)]).is_none());
        assert!(tracker.update(2, &[]).is_none());
        assert_eq!(tracker.last().map(|p| p.frame), Some(0));
    }

    #[test]
    fn test_max_step_scales_with_gap() {
        let mut tracker = GreedyBallTracker::default();
        tracker.update(0, &[Candidate::at(0.0, 0.0)]);
        assert!(tracker.update(1, &[Candidate::at(200.0, 0.0)]).is_none());
        assert!(tracker.update(2, &[Candidate::at(200.0, 0.0)]).is_some());
    }

    #[test]
    fn test_track_moving_disc() {
        let images: Vec<GrayImage> = (0..10)
            .map(|i| {
                let mut img = GrayImage::new(320, 120);
                draw_disc(&mut img, 20 + 30 * i, 30 + 5 * i, 4, 255);
                img
            })
            .collect();
        let frames = FrameSequence::from_images(images, 30.0);

        let positions = track_ball(&mut MotionDetector::default(), &frames, &TrackerConfig::default());

        // frame 0 only seeds the background
        assert_eq!(positions.len(), 9);
        assert!(positions.windows(2).all(|w| w[1].x > w[0].x));
        let last = positions.last().unwrap();
        assert!((last.x - 290.0).abs() < 1.5 && (last.y - 75.0).abs() < 1.5);
    }

    #[test]
    fn test_track_with_nothing_visible() {
        let frames = FrameSequence::from_images(vec![GrayImage::new(32, 32); 8], 30.0);
        let mut detector = ReplayDetector::default();
        assert!(track_ball(&mut detector, &frames, &TrackerConfig::default()).is_empty());
    }
}
