//! Ball positions in pixel space.
//!
//! Detectors and callers hand positions over in several shapes (`{x, y}`,
//! `{x, y, frame}`, `[x, y]`, `[x, y, frame]`). [`RawPosition`] accepts all of
//! them and [`normalize_positions`] turns them into a single ordered
//! [`Position`] sequence before anything downstream sees them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pixel dimensions of the analysed frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f(&self) -> f64 {
        self.width as f64
    }

    pub fn height_f(&self) -> f64 {
        self.height as f64
    }
}

/// A ball observation: pixel coordinates plus the frame it was seen in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Frame index within the delivery clip.
    pub frame: u32,
}

impl Position {
    pub fn new(x: f64, y: f64, frame: u32) -> Self {
        Self { x, y, frame }
    }

    /// Euclidean pixel distance to another position.
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Position scaled into `[0, 1]` frame coordinates.
    pub fn normalized(&self, size: FrameSize) -> NormalizedPoint {
        NormalizedPoint {
            x: (self.x / size.width_f().max(1.0)).clamp(0.0, 1.0),
            y: (self.y / size.height_f().max(1.0)).clamp(0.0, 1.0),
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A point in normalized frame coordinates (`0.0..=1.0` on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// Any accepted wire shape for a position.
///
/// Variant order matters for untagged deserialization: objects with a frame
/// are tried before bare objects, and triples before pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPosition {
    Object {
        x: f64,
        y: f64,
        #[serde(default)]
        frame: Option<u32>,
    },
    Triple([f64; 3]),
    Pair([f64; 2]),
}

impl RawPosition {
    fn parts(&self) -> (f64, f64, Option<u32>) {
        match *self {
            RawPosition::Object { x, y, frame } => (x, y, frame),
            RawPosition::Triple([x, y, f]) => {
                let frame = (f.is_finite() && f >= 0.0).then(|| f.round() as u32);
                (x, y, frame)
            }
            RawPosition::Pair([x, y]) => (x, y, None),
        }
    }
}

impl From<Position> for RawPosition {
    fn from(p: Position) -> Self {
        RawPosition::Object {
            x: p.x,
            y: p.y,
            frame: Some(p.frame),
        }
    }
}

/// Normalize raw positions into an ordered [`Position`] sequence.
///
/// - Entries without a frame index get the previous entry's frame + 1
///   (or 0 for the first entry).
/// - Non-finite coordinates are dropped.
/// - The result is stably sorted by frame, so the frame index is
///   non-decreasing across the sequence.
pub fn normalize_positions<I>(raw: I) -> Vec<Position>
where
    I: IntoIterator<Item = RawPosition>,
{
    let mut next_frame: u32 = 0;
    let mut out: Vec<Position> = raw
        .into_iter()
        .filter_map(|r| {
            let (x, y, frame) = r.parts();
            let frame = frame.unwrap_or(next_frame);
            next_frame = frame.saturating_add(1);
            let p = Position::new(x, y, frame);
            p.is_finite().then_some(p)
        })
        .collect();

    out.sort_by_key(|p| p.frame);
    out
}

/// True when frame indices never decrease along the sequence.
pub fn is_frame_ordered(positions: &[Position]) -> bool {
    positions.windows(2).all(|w| w[0].frame <= w[1].frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_position_shapes() {
        let json = r#"[{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0, "frame": 7}, [5.0, 6.0], [7.0, 8.0, 9]]"#;
        let raw: Vec<RawPosition> = serde_json::from_str(json).unwrap();

        assert_eq!(raw[0], RawPosition::Object { x: 1.0, y: 2.0, frame: None });
        assert_eq!(raw[1], RawPosition::Object { x: 3.0, y: 4.0, frame: Some(7) });
        assert_eq!(raw[2], RawPosition::Pair([5.0, 6.0]));
        assert_eq!(raw[3], RawPosition::Triple([7.0, 8.0, 9.0]));
    }

    #[test]
    fn test_normalize_assigns_missing_frames() {
        let raw = vec![
            RawPosition::Pair([10.0, 10.0]),
            RawPosition::Pair([12.0, 14.0]),
            RawPosition::Object { x: 20.0, y: 20.0, frame: Some(5) },
            RawPosition::Pair([22.0, 24.0]),
        ];

        let positions = normalize_positions(raw);
        let frames: Vec<u32> = positions.iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![0, 1, 5, 6]);
    }

    #[test]
    fn test_normalize_sorts_and_drops_non_finite() {
        let raw = vec![
            RawPosition::Triple([1.0, 1.0, 4.0]),
            RawPosition::Triple([f64::NAN, 1.0, 2.0]),
            RawPosition::Triple([2.0, 2.0, 1.0]),
        ];

        let positions = normalize_positions(raw);
        assert_eq!(positions.len(), 2);
        assert!(is_frame_ordered(&positions));
        assert_eq!(positions[0].frame, 1);
    }

    #[test]
    fn test_normalized_point_is_clamped() {
        let size = FrameSize::new(640, 360);
        let p = Position::new(700.0, 180.0, 0).normalized(size);
        assert_eq!(p.x, 1.0);
        assert!((p.y - 0.5).abs() < 1e-9);
    }
}
