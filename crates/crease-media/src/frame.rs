//! Decoded grayscale frames.

use image::GrayImage;

use crease_models::FrameSize;

/// One decoded frame. Lives only for the duration of a delivery's analysis.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based frame index within the clip.
    pub index: u32,
    pub timestamp_ms: f64,
    pub image: GrayImage,
}

impl Frame {
    pub fn new(index: u32, timestamp_ms: f64, image: GrayImage) -> Self {
        Self {
            index,
            timestamp_ms,
            image,
        }
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.image.width(), self.image.height())
    }
}

/// Ordered frames of one clip at a known frame rate.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub frames: Vec<Frame>,
    /// Frame rate used for timing (after override and clamping).
    pub fps: f64,
    pub size: FrameSize,
}

impl FrameSequence {
    /// Wrap pre-decoded grayscale images, assigning indices and timestamps.
    pub fn from_images(images: Vec<GrayImage>, fps: f64) -> Self {
        let size = images
            .first()
            .map(|img| FrameSize::new(img.width(), img.height()))
            .unwrap_or(FrameSize::new(0, 0));
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(i, image)| Frame::new(i as u32, i as f64 * 1000.0 / fps, image))
            .collect();

        Self { frames, fps, size }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }
}
