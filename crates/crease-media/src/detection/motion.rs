//! Motion-based ball detection.
//!
//! Each frame is blurred and compared against a background (the previous
//! frame, or a running per-pixel average). The thresholded difference is
//! dilated, split into connected components and filtered down to small,
//! near-round blobs. Differencing, dilation and labelling run on OpenCV in
//! the default build.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::circle::CircleDetector;
use super::imaging::{blur, Blob};
use super::{BallDetector, Candidate};
use crate::error::MediaResult;
use crate::frame::Frame;

pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;
pub const DEFAULT_DIFF_THRESHOLD: u8 = 25;
pub const DEFAULT_DILATE_ITERATIONS: usize = 2;
/// Blob area bounds in pixels at 640px frame width.
pub const DEFAULT_MIN_AREA: f64 = 25.0;
pub const DEFAULT_MAX_AREA: f64 = 600.0;
pub const DEFAULT_MAX_ASPECT: f64 = 2.0;
/// A disc fills ~0.79 of its bounding box.
pub const DEFAULT_MIN_FILL: f64 = 0.45;

/// How the background is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundModel {
    /// Difference against the previous frame.
    PreviousFrame,
    /// Exponential running average with the given learning rate.
    RunningAverage { learning_rate: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDetectorConfig {
    pub background: BackgroundModel,
    pub blur_sigma: f32,
    pub diff_threshold: u8,
    pub dilate_iterations: usize,
    pub min_area: f64,
    pub max_area: f64,
    pub max_aspect: f64,
    pub min_fill: f64,
    /// Run the circle detector when no motion blob qualifies.
    pub circle_fallback: bool,
}

impl Default for MotionDetectorConfig {
    fn default() -> Self {
        Self {
            background: BackgroundModel::PreviousFrame,
            blur_sigma: DEFAULT_BLUR_SIGMA,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            min_area: DEFAULT_MIN_AREA,
            max_area: DEFAULT_MAX_AREA,
            max_aspect: DEFAULT_MAX_ASPECT,
            min_fill: DEFAULT_MIN_FILL,
            circle_fallback: false,
        }
    }
}

impl MotionDetectorConfig {
    pub fn with_background(mut self, background: BackgroundModel) -> Self {
        self.background = background;
        self
    }

    pub fn with_area_range(mut self, min_area: f64, max_area: f64) -> Self {
        self.min_area = min_area;
        self.max_area = max_area;
        self
    }

    pub fn with_circle_fallback(mut self, enabled: bool) -> Self {
        self.circle_fallback = enabled;
        self
    }
}

pub struct MotionDetector {
    config: MotionDetectorConfig,
    /// Blurred previous frame, or the running average (as f32 for precision).
    background: Option<Vec<f32>>,
    dims: (u32, u32),
    fallback: Option<CircleDetector>,
}

impl MotionDetector {
    pub fn new(config: MotionDetectorConfig) -> Self {
        let fallback = config.circle_fallback.then(CircleDetector::default);
        Self {
            config,
            background: None,
            dims: (0, 0),
            fallback,
        }
    }

    fn accepts(&self, blob: &Blob) -> bool {
        let area = blob.area as f64;
        area >= self.config.min_area
            && area <= self.config.max_area
            && blob.aspect() <= self.config.max_aspect
            && blob.fill() >= self.config.min_fill
    }

    fn to_candidate(blob: &Blob) -> Candidate {
        Candidate {
            x: blob.cx,
            y: blob.cy,
            area: blob.area as f64,
            radius: (blob.area as f64 / std::f64::consts::PI).sqrt(),
            score: (blob.fill() / blob.aspect()).clamp(0.0, 1.0),
        }
    }

    fn update_background(&mut self, blurred: &GrayImage) {
        let current = blurred.as_raw();
        match (self.config.background, self.background.as_mut()) {
            (BackgroundModel::RunningAverage { learning_rate }, Some(bg)) => {
                let rate = learning_rate.clamp(0.0, 1.0);
                for (b, &c) in bg.iter_mut().zip(current) {
                    *b += rate * (c as f32 - *b);
                }
            }
            _ => {
                self.background = Some(current.iter().map(|&v| v as f32).collect());
            }
        }
    }

    fn background_image(&self) -> Option<GrayImage> {
        let bg = self.background.as_ref()?;
        let raw = bg.iter().map(|v| v.round().clamp(0.0, 255.0) as u8).collect();
        GrayImage::from_raw(self.dims.0, self.dims.1, raw)
    }
}

#[cfg(feature = "opencv")]
fn motion_blobs(current: &GrayImage, background: &GrayImage, config: &MotionDetectorConfig) -> MediaResult<Vec<Blob>> {
    use super::cv;

    let mask = cv::motion_mask(
        &cv::to_mat(current)?,
        &cv::to_mat(background)?,
        config.diff_threshold,
        config.dilate_iterations,
    )?;
    cv::connected_components(&mask)
}

#[cfg(not(feature = "opencv"))]
fn motion_blobs(current: &GrayImage, background: &GrayImage, config: &MotionDetectorConfig) -> MediaResult<Vec<Blob>> {
    use super::imaging::{abs_diff, connected_components, dilate, threshold};

    let (w, h) = current.dimensions();
    let diff = abs_diff(current, background);
    let mask = threshold(&diff, config.diff_threshold);
    let mask = dilate(&mask, w, h, config.dilate_iterations);
    Ok(connected_components(&mask, w, h))
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(MotionDetectorConfig::default())
    }
}

impl BallDetector for MotionDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        let (w, h) = frame.image.dimensions();
        if self.dims != (w, h) {
            self.background = None;
            self.dims = (w, h);
        }

        let blurred = blur(&frame.image, self.config.blur_sigma);
        let Some(background) = self.background_image() else {
            self.update_background(&blurred);
            return Vec::new();
        };

        let blobs = match motion_blobs(&blurred, &background, &self.config) {
            Ok(blobs) => blobs,
            Err(e) => {
                warn!(frame = frame.index, "Motion detection failed: {}", e);
                Vec::new()
            }
        };

        let mut candidates: Vec<Candidate> = blobs
            .iter()
            .filter(|b| self.accepts(b))
            .map(Self::to_candidate)
            .collect();

        trace!(
            frame = frame.index,
            blobs = blobs.len(),
            candidates = candidates.len(),
            "Motion candidates"
        );

        self.update_background(&blurred);

        if candidates.is_empty() {
            if let Some(fallback) = self.fallback.as_mut() {
                candidates = fallback.detect(frame);
            }
        }

        candidates
    }

    fn reset(&mut self) {
        self.background = None;
        self.dims = (0, 0);
    }

    fn name(&self) -> &'static str {
        "motion"
    }
}
