//! Gradient Hough transform for small round blobs.
//!
//! Used as a fallback when frame differencing yields nothing usable (for
//! example when the camera itself moves). Each strong edge pixel votes for
//! centres along its gradient direction at every radius in range. The
//! default build delegates to OpenCV's `HoughCircles`.

use serde::{Deserialize, Serialize};
#[cfg(feature = "opencv")]
use tracing::warn;

use super::imaging::blur;
use super::{BallDetector, Candidate};
use crate::frame::Frame;

pub const DEFAULT_MIN_RADIUS: u32 = 3;
pub const DEFAULT_MAX_RADIUS: u32 = 12;
/// Sobel magnitude an edge pixel needs before it votes.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 120.0;
/// Votes needed, as a fraction of the circle's circumference.
pub const DEFAULT_MIN_VOTE_RATIO: f64 = 0.55;
pub const DEFAULT_MAX_CIRCLES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    pub min_radius: u32,
    pub max_radius: u32,
    pub edge_threshold: f64,
    pub min_vote_ratio: f64,
    pub max_circles: usize,
    pub blur_sigma: f32,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            min_vote_ratio: DEFAULT_MIN_VOTE_RATIO,
            max_circles: DEFAULT_MAX_CIRCLES,
            blur_sigma: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CircleDetector {
    config: CircleConfig,
}

impl CircleDetector {
    pub fn new(config: CircleConfig) -> Self {
        Self { config }
    }

    /// Votes a centre needs at the smallest radius.
    fn min_votes(&self) -> f64 {
        self.config.min_vote_ratio * 2.0 * std::f64::consts::PI * self.config.min_radius.max(1) as f64
    }

    /// Find circles in a grayscale frame, strongest first.
    #[cfg(feature = "opencv")]
    pub fn find_circles(&self, frame: &Frame) -> Vec<Candidate> {
        use super::cv;

        let (r_min, r_max) = (self.config.min_radius.max(1), self.config.max_radius);
        if frame.image.width() < 3 || frame.image.height() < 3 || r_max < r_min {
            return Vec::new();
        }

        let img = blur(&frame.image, self.config.blur_sigma);
        let found = cv::to_mat(&img).and_then(|mat| {
            cv::hough_circles(
                &mat,
                r_max as f64,
                self.config.edge_threshold,
                self.min_votes(),
                r_min,
                r_max,
            )
        });

        match found {
            Ok(circles) => circles
                .into_iter()
                .take(self.config.max_circles)
                .enumerate()
                .map(|(rank, (x, y, r))| Candidate {
                    x,
                    y,
                    area: std::f64::consts::PI * r * r,
                    radius: r,
                    score: 1.0 / (1.0 + rank as f64),
                })
                .collect(),
            Err(e) => {
                warn!(frame = frame.index, "Circle detection failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Find circles in a grayscale frame, strongest first.
    #[cfg(not(feature = "opencv"))]
    pub fn find_circles(&self, frame: &Frame) -> Vec<Candidate> {
        let img = blur(&frame.image, self.config.blur_sigma);
        let (w, h) = (img.width() as usize, img.height() as usize);
        let (r_min, r_max) = (self.config.min_radius.max(1), self.config.max_radius);
        if w < 3 || h < 3 || r_max < r_min {
            return Vec::new();
        }

        let radii = (r_max - r_min + 1) as usize;
        let mut acc = vec![0u16; radii * w * h];
        let px = |x: usize, y: usize| img.as_raw()[y * w + x] as f64;

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let gx = (px(x + 1, y - 1) + 2.0 * px(x + 1, y) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x - 1, y) + px(x - 1, y + 1));
                let gy = (px(x - 1, y + 1) + 2.0 * px(x, y + 1) + px(x + 1, y + 1))
                    - (px(x - 1, y - 1) + 2.0 * px(x, y - 1) + px(x + 1, y - 1));
                let mag = gx.hypot(gy);
                if mag < self.config.edge_threshold {
                    continue;
                }

                let (dx, dy) = (gx / mag, gy / mag);
                for ri in 0..radii {
                    let r = (r_min as usize + ri) as f64;
                    for sign in [-1.0, 1.0] {
                        let cx = (x as f64 + sign * r * dx).round();
                        let cy = (y as f64 + sign * r * dy).round();
                        if cx >= 0.0 && cy >= 0.0 && (cx as usize) < w && (cy as usize) < h {
                            let slot = &mut acc[ri * w * h + cy as usize * w + cx as usize];
                            *slot = slot.saturating_add(1);
                        }
                    }
                }
            }
        }

        let mut peaks: Vec<(f64, Candidate)> = Vec::new();
        for ri in 0..radii {
            let r = (r_min as usize + ri) as f64;
            let needed = self.min_votes() * r / r_min as f64;
            let plane = &acc[ri * w * h..(ri + 1) * w * h];
            for (i, &votes) in plane.iter().enumerate() {
                if (votes as f64) >= needed {
                    let strength = votes as f64 / (2.0 * std::f64::consts::PI * r);
                    let candidate = Candidate {
                        x: (i % w) as f64,
                        y: (i / w) as f64,
                        area: std::f64::consts::PI * r * r,
                        radius: r,
                        score: strength.min(1.0),
                    };
                    peaks.push((strength, candidate));
                }
            }
        }

        // Strongest first, then non-maximum suppression by centre distance.
        peaks.sort_by(|a, b| b.0.total_cmp(&a.0));
        let mut circles: Vec<Candidate> = Vec::new();
        for (_, peak) in peaks {
            if circles.len() >= self.config.max_circles {
                break;
            }
            let suppressed = circles
                .iter()
                .any(|c| c.distance_to(peak.x, peak.y) < r_max as f64);
            if !suppressed {
                circles.push(peak);
            }
        }

        circles
    }
}

impl BallDetector for CircleDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Candidate> {
        self.find_circles(frame)
    }

    fn name(&self) -> &'static str {
        "circle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::imaging::draw_disc;
    use image::GrayImage;

    #[test]
    fn test_finds_bright_disc() {
        let mut img = GrayImage::new(120, 90);
        draw_disc(&mut img, 60, 40, 7, 230);
        let frame = Frame::new(0, 0.0, img);

        let circles = CircleDetector::default().find_circles(&frame);
        assert!(!circles.is_empty());
        let best = circles[0];
        assert!(best.distance_to(60.0, 40.0) <= 2.0, "best at {:?}", best);
        assert!((best.radius - 7.0).abs() <= 2.5);
    }

    #[test]
    fn test_blank_frame_has_no_circles() {
        let frame = Frame::new(0, 0.0, GrayImage::new(64, 48));
        assert!(CircleDetector::default().find_circles(&frame).is_empty());
    }
}
