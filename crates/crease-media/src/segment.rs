//! Split a net-session clip into individual deliveries by motion.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Frame, FrameSequence};

pub const DEFAULT_PIXEL_THRESHOLD: u8 = 25;
/// Changed pixels needed for a frame to count as moving.
pub const DEFAULT_MIN_MOVEMENT: usize = 15;
/// Consecutive still frames that end a delivery.
pub const DEFAULT_IDLE_FRAMES: usize = 25;
pub const DEFAULT_MIN_SEGMENT_FRAMES: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    pub pixel_threshold: u8,
    pub min_movement: usize,
    pub idle_frames: usize,
    pub min_segment_frames: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: DEFAULT_PIXEL_THRESHOLD,
            min_movement: DEFAULT_MIN_MOVEMENT,
            idle_frames: DEFAULT_IDLE_FRAMES,
            min_segment_frames: DEFAULT_MIN_SEGMENT_FRAMES,
        }
    }
}

/// A contiguous run of moving frames (inclusive bounds, source frame indices).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliverySegment {
    pub index: usize,
    pub start_frame: u32,
    pub end_frame: u32,
    pub start_ms: f64,
    pub end_ms: f64,
}

impl DeliverySegment {
    pub fn frame_count(&self) -> usize {
        (self.end_frame - self.start_frame + 1) as usize
    }

    /// Copy this segment's frames out, re-indexed from zero.
    pub fn extract(&self, sequence: &FrameSequence) -> FrameSequence {
        let frames = sequence
            .frames
            .iter()
            .filter(|f| f.index >= self.start_frame && f.index <= self.end_frame)
            .map(|f| {
                let index = f.index - self.start_frame;
                Frame::new(index, index as f64 * 1000.0 / sequence.fps, f.image.clone())
            })
            .collect();

        FrameSequence {
            frames,
            fps: sequence.fps,
            size: sequence.size,
        }
    }
}

/// Changed-pixel count between each frame and its predecessor (first frame is 0).
pub fn motion_profile(sequence: &FrameSequence, pixel_threshold: u8) -> Vec<usize> {
    let mut profile = vec![0];
    profile.par_extend(sequence.frames.par_windows(2).map(|pair| {
        pair[0]
            .image
            .as_raw()
            .iter()
            .zip(pair[1].image.as_raw())
            .filter(|(a, b)| a.abs_diff(**b) > pixel_threshold)
            .count()
    }));
    profile.truncate(sequence.frames.len());
    profile
}

pub fn split_deliveries(sequence: &FrameSequence, config: &SegmentConfig) -> Vec<DeliverySegment> {
    let profile = motion_profile(sequence, config.pixel_threshold);
    let mut segments = Vec::new();
    let mut open: Option<(usize, usize)> = None; // (first moving, last moving) positions
    let mut idle = 0usize;

    let close = |first: usize, last: usize, segments: &mut Vec<DeliverySegment>| {
        if last - first + 1 >= config.min_segment_frames {
            let (start, end) = (&sequence.frames[first], &sequence.frames[last]);
            segments.push(DeliverySegment {
                index: segments.len(),
                start_frame: start.index,
                end_frame: end.index,
                start_ms: start.timestamp_ms,
                end_ms: end.timestamp_ms,
            });
        }
    };

    for (i, &movement) in profile.iter().enumerate() {
        if movement > config.min_movement {
            idle = 0;
            open = Some(match open {
                Some((first, _)) => (first, i),
                None => (i, i),
            });
        } else {
            idle += 1;
            if idle > config.idle_frames {
                if let Some((first, last)) = open.take() {
                    close(first, last, &mut segments);
                }
            }
        }
    }
    if let Some((first, last)) = open {
        close(first, last, &mut segments);
    }

    debug!(frames = sequence.len(), deliveries = segments.len(), "Split deliveries");
    segments
}
