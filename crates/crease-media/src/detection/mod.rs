//! Ball detection.
//!
//! Detectors sit behind the [`BallDetector`] capability so the tracker and
//! everything downstream never depend on how candidates were found:
//!
//! | Detector | Method |
//! |----------|--------|
//! | [`MotionDetector`] | frame differencing / running background, connected components |
//! | [`CircleDetector`] | gradient Hough transform for round blobs |
//! | [`ReplayDetector`] | precomputed detections (e.g. from an external trained model) |

pub mod circle;
#[cfg(feature = "opencv")]
pub mod cv;
pub mod imaging;
pub mod motion;
pub mod replay;

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

pub use circle::{CircleConfig, CircleDetector};
pub use motion::{BackgroundModel, MotionDetector, MotionDetectorConfig};
pub use replay::ReplayDetector;

/// A possible ball location in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub x: f64,
    pub y: f64,
    /// Blob area in pixels (0 when unknown).
    pub area: f64,
    /// Estimated radius in pixels.
    pub radius: f64,
    /// Detector-specific quality in `[0, 1]`.
    pub score: f64,
}

impl Candidate {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            area: 0.0,
            radius: 0.0,
            score: 1.0,
        }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Per-frame ball localization capability.
///
/// Detectors may keep state between frames of one clip (a background model,
/// the previous frame). A detector instance must not be shared across clips
/// without calling [`BallDetector::reset`].
pub trait BallDetector: Send {
    /// Candidate positions in this frame. An empty result is normal.
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate>;

    /// Drop any per-clip state.
    fn reset(&mut self) {}

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}
