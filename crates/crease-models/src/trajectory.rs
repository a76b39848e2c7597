//! Cleaned ball trajectories and their event markers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::position::{FrameSize, Position};

/// One delivery's cleaned ball path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Trajectory {
    /// Positions after jitter removal, before smoothing.
    pub cleaned: Vec<Position>,
    /// Moving-average smoothed positions. Same length and frames as `cleaned`.
    pub smoothed: Vec<Position>,
    /// Frames per second of the source clip.
    pub fps: f64,
    pub frame_size: FrameSize,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }

    /// Elapsed seconds between the first point and `frame`.
    pub fn elapsed_secs(&self, frame: u32) -> f64 {
        let start = self.smoothed.first().map(|p| p.frame).unwrap_or(0);
        frame.saturating_sub(start) as f64 / self.fps
    }
}

/// Named indices into a [`Trajectory`]'s points. `None` means undetected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EventMarkers {
    /// Index of the release point (start of tracked flight).
    pub release: Option<usize>,
    /// Index of the bounce/pitch point.
    pub bounce: Option<usize>,
    /// Index of the bat/pad contact point.
    pub contact: Option<usize>,
}

impl EventMarkers {
    /// Resolve a marker index into the point it names.
    pub fn point(trajectory: &Trajectory, index: Option<usize>) -> Option<Position> {
        index.and_then(|i| trajectory.smoothed.get(i).copied())
    }
}

/// Why a trajectory could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsufficientReason {
    /// Fewer usable positions than the minimum.
    TooFewPoints,
    /// Bounce split left a segment too short to fit.
    NoClearPitch,
    /// A segment fit was numerically degenerate.
    FitFailed,
}

impl InsufficientReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsufficientReason::TooFewPoints => "TOO_FEW_POINTS",
            InsufficientReason::NoClearPitch => "NO_CLEAR_PITCH",
            InsufficientReason::FitFailed => "FIT_FAILED",
        }
    }
}

impl std::fmt::Display for InsufficientReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_reason_serde() {
        let json = serde_json::to_string(&InsufficientReason::NoClearPitch).unwrap();
        assert_eq!(json, "\"NO_CLEAR_PITCH\"");
    }

    #[test]
    fn test_marker_point_lookup() {
        let points = vec![Position::new(1.0, 2.0, 3), Position::new(4.0, 5.0, 4)];
        let trajectory = Trajectory {
            cleaned: points.clone(),
            smoothed: points,
            fps: 30.0,
            frame_size: FrameSize::new(640, 360),
        };

        assert_eq!(EventMarkers::point(&trajectory, Some(1)).map(|p| p.frame), Some(4));
        assert!(EventMarkers::point(&trajectory, Some(9)).is_none());
        assert!(EventMarkers::point(&trajectory, None).is_none());
        assert!((trajectory.elapsed_secs(4) - 1.0 / 30.0).abs() < 1e-12);
    }
}
