//! OpenCV-backed raster operations for motion and circle detection.

use image::GrayImage;
use opencv::{
    core::{self, Mat, Point, Size, Vec3f, Vector},
    imgproc,
    prelude::*,
};

use super::imaging::Blob;
use crate::error::{MediaError, MediaResult};

/// Copy a grayscale image into an owned single-channel `Mat`.
pub fn to_mat(image: &GrayImage) -> MediaResult<Mat> {
    let rows = image.height() as i32;
    let cols = image.width() as i32;
    Mat::new_rows_cols_with_data(rows, cols, image.as_raw().as_slice())
        .and_then(|m| m.try_clone())
        .map_err(|e| MediaError::detection_failed(format!("gray to mat: {e}")))
}

/// Thresholded, dilated difference between a frame and its background.
pub fn motion_mask(current: &Mat, background: &Mat, threshold: u8, dilate_iterations: usize) -> MediaResult<Mat> {
    let mut diff = Mat::default();
    core::absdiff(current, background, &mut diff)
        .map_err(|e| MediaError::detection_failed(format!("motion absdiff: {e}")))?;

    let mut mask = Mat::default();
    imgproc::threshold(&diff, &mut mask, threshold as f64, 255.0, imgproc::THRESH_BINARY)
        .map_err(|e| MediaError::detection_failed(format!("motion threshold: {e}")))?;

    if dilate_iterations == 0 {
        return Ok(mask);
    }

    let kernel = imgproc::get_structuring_element(imgproc::MORPH_RECT, Size::new(3, 3), Point::new(-1, -1))
        .map_err(|e| MediaError::detection_failed(format!("motion kernel: {e}")))?;
    let border = imgproc::morphology_default_border_value()
        .map_err(|e| MediaError::detection_failed(format!("motion border: {e}")))?;

    let mut dilated = Mat::default();
    imgproc::dilate(
        &mask,
        &mut dilated,
        &kernel,
        Point::new(-1, -1),
        dilate_iterations as i32,
        core::BORDER_CONSTANT,
        border,
    )
    .map_err(|e| MediaError::detection_failed(format!("motion dilate: {e}")))?;

    Ok(dilated)
}

/// 8-connected components of a binary mask. Label 0 (background) is skipped.
pub fn connected_components(mask: &Mat) -> MediaResult<Vec<Blob>> {
    let mut labels = Mat::default();
    let mut stats = Mat::default();
    let mut centroids = Mat::default();
    let count = imgproc::connected_components_with_stats(mask, &mut labels, &mut stats, &mut centroids, 8, core::CV_32S)
        .map_err(|e| MediaError::detection_failed(format!("connected components: {e}")))?;

    let stat = |row: i32, col: i32| -> MediaResult<i32> {
        stats
            .at_2d::<i32>(row, col)
            .copied()
            .map_err(|e| MediaError::detection_failed(format!("component stats: {e}")))
    };
    let centroid = |row: i32, col: i32| -> MediaResult<f64> {
        centroids
            .at_2d::<f64>(row, col)
            .copied()
            .map_err(|e| MediaError::detection_failed(format!("component centroid: {e}")))
    };

    let mut blobs = Vec::with_capacity(count.max(1) as usize - 1);
    for label in 1..count {
        let left = stat(label, imgproc::CC_STAT_LEFT)?;
        let top = stat(label, imgproc::CC_STAT_TOP)?;
        let width = stat(label, imgproc::CC_STAT_WIDTH)?;
        let height = stat(label, imgproc::CC_STAT_HEIGHT)?;
        let area = stat(label, imgproc::CC_STAT_AREA)?;
        if area <= 0 || width <= 0 || height <= 0 {
            continue;
        }

        blobs.push(Blob {
            area: area as usize,
            min_x: left as u32,
            max_x: (left + width - 1) as u32,
            min_y: top as u32,
            max_y: (top + height - 1) as u32,
            cx: centroid(label, 0)?,
            cy: centroid(label, 1)?,
        });
    }

    Ok(blobs)
}

/// Gradient Hough circles as `(x, y, radius)`, strongest first.
pub fn hough_circles(
    image: &Mat,
    min_dist: f64,
    edge_threshold: f64,
    accumulator_threshold: f64,
    min_radius: u32,
    max_radius: u32,
) -> MediaResult<Vec<(f64, f64, f64)>> {
    let mut circles: Vector<Vec3f> = Vector::new();
    imgproc::hough_circles(
        image,
        &mut circles,
        imgproc::HOUGH_GRADIENT,
        1.0,
        min_dist.max(1.0),
        edge_threshold,
        accumulator_threshold.max(1.0),
        min_radius as i32,
        max_radius as i32,
    )
    .map_err(|e| MediaError::detection_failed(format!("hough circles: {e}")))?;

    Ok(circles
        .iter()
        .map(|c| (c[0] as f64, c[1] as f64, c[2] as f64))
        .collect())
}
