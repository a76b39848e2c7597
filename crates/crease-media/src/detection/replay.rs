//! Replays precomputed detections, e.g. from an external trained detector.

use std::collections::HashMap;

use crease_models::Position;

use super::{BallDetector, Candidate};
use crate::frame::Frame;

/// Serves candidates keyed by frame index.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    by_frame: HashMap<u32, Vec<Candidate>>,
}

impl ReplayDetector {
    pub fn new(by_frame: HashMap<u32, Vec<Candidate>>) -> Self {
        Self { by_frame }
    }

    /// One candidate per recorded position.
    pub fn from_positions(positions: &[Position]) -> Self {
        let mut by_frame: HashMap<u32, Vec<Candidate>> = HashMap::new();
        for p in positions {
            by_frame.entry(p.frame).or_default().push(Candidate::at(p.x, p.y));
        }
        Self { by_frame }
    }

    pub fn frames_with_detections(&self) -> usize {
        self.by_frame.len()
    }
}

impl BallDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        self.by_frame.get(&frame.index).cloned().unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_replays_by_frame_index() {
        let positions = [Position::new(10.0, 20.0, 2), Position::new(11.0, 22.0, 3)];
        let mut detector = ReplayDetector::from_positions(&positions);

        let blank = |i| Frame::new(i, 0.0, GrayImage::new(4, 4));
        assert!(detector.detect(&blank(0)).is_empty());
        assert_eq!(detector.detect(&blank(3)), vec![Candidate::at(11.0, 22.0)]);
        assert_eq!(detector.frames_with_detections(), 2);
    }
}
