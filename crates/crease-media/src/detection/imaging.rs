//! Grayscale raster operations for motion detection.
//!
//! [`Blob`] and [`blur`] are shared by both builds. The differencing,
//! morphology and labelling functions are the pure-Rust path used when the
//! `opencv` feature is disabled; see `detection::cv` for the default build.

use image::{GrayImage, Luma};

/// Gaussian blur. A sigma of 1.4 matches a 7x7 kernel.
pub fn blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    image::imageops::blur(image, sigma)
}

#[cfg(not(feature = "opencv"))]
/// Per-pixel absolute difference. Images must share dimensions.
pub fn abs_diff(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for (o, (pa, pb)) in out.pixels_mut().zip(a.pixels().zip(b.pixels())) {
        *o = Luma([pa.0[0].abs_diff(pb.0[0])]);
    }
    out
}

#[cfg(not(feature = "opencv"))]
/// Binary mask of pixels strictly above `threshold`.
pub fn threshold(image: &GrayImage, threshold: u8) -> Vec<bool> {
    image.pixels().map(|p| p.0[0] > threshold).collect()
}

#[cfg(not(feature = "opencv"))]
/// 3x3 binary dilation, applied `iterations` times.
pub fn dilate(mask: &[bool], width: u32, height: u32, iterations: usize) -> Vec<bool> {
    let (w, h) = (width as usize, height as usize);
    let mut current = mask.to_vec();

    for _ in 0..iterations {
        let mut next = vec![false; current.len()];
        for y in 0..h {
            for x in 0..w {
                if !current[y * w + x] {
                    continue;
                }
                for ny in y.saturating_sub(1)..(y + 2).min(h) {
                    for nx in x.saturating_sub(1)..(x + 2).min(w) {
                        next[ny * w + nx] = true;
                    }
                }
            }
        }
        current = next;
    }

    current
}

/// An 8-connected foreground region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub area: usize,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
    pub cx: f64,
    pub cy: f64,
}

impl Blob {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Longer bounding-box side over the shorter one.
    pub fn aspect(&self) -> f64 {
        let (w, h) = (self.width() as f64, self.height() as f64);
        w.max(h) / w.min(h)
    }

    /// Fraction of the bounding box covered by the blob.
    pub fn fill(&self) -> f64 {
        self.area as f64 / (self.width() as f64 * self.height() as f64)
    }
}

#[cfg(not(feature = "opencv"))]
/// Connected components of a binary mask (8-connectivity).
pub fn connected_components(mask: &[bool], width: u32, height: u32) -> Vec<Blob> {
    let (w, h) = (width as usize, height as usize);
    let mut visited = vec![false; mask.len()];
    let mut blobs = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }

        visited[start] = true;
        stack.push(start);

        let (mut area, mut sum_x, mut sum_y) = (0usize, 0.0f64, 0.0f64);
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (usize::MAX, 0, usize::MAX, 0);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            area += 1;
            sum_x += x as f64;
            sum_y += y as f64;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            for ny in y.saturating_sub(1)..(y + 2).min(h) {
                for nx in x.saturating_sub(1)..(x + 2).min(w) {
                    let n = ny * w + nx;
                    if mask[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        blobs.push(Blob {
            area,
            min_x: min_x as u32,
            max_x: max_x as u32,
            min_y: min_y as u32,
            max_y: max_y as u32,
            cx: sum_x / area as f64,
            cy: sum_y / area as f64,
        });
    }

    blobs
}

/// Draw a filled disc. Used to build synthetic frames.
pub fn draw_disc(image: &mut GrayImage, cx: i64, cy: i64, radius: i64, value: u8) {
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let inside = (x - cx).pow(2) + (y - cy).pow(2) <= radius * radius;
            if inside && x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
                image.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
}
