//! Pitch-plane calibration.
//!
//! Four pixel corners of the pitch rectangle map onto real-world metres
//! through a plane homography, solved with the direct linear transform.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::math::solve_linear_system;

/// Width of the pitch between the return creases, metres.
pub const PITCH_WIDTH_M: f64 = 3.05;
/// Stump to stump, metres.
pub const PITCH_LENGTH_M: f64 = 20.12;

/// Pixel corners of the pitch, bowler's end first, clockwise from the
/// bowler's left.
pub type PitchCorners = [(f64, f64); 4];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchCalibration {
    /// Row-major 3x3 homography, pixels to metres, `h[2][2] == 1`.
    h: [[f64; 3]; 3],
}

impl PitchCalibration {
    /// Solve the homography taking `corners` onto the pitch rectangle.
    pub fn from_corners(corners: PitchCorners) -> EngineResult<Self> {
        if corners.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(EngineError::degenerate_calibration("non-finite corner"));
        }

        let world = [
            (0.0, 0.0),
            (PITCH_WIDTH_M, 0.0),
            (PITCH_WIDTH_M, PITCH_LENGTH_M),
            (0.0, PITCH_LENGTH_M),
        ];

        let mut a = Vec::with_capacity(8);
        let mut b = Vec::with_capacity(8);
        for (&(x, y), &(wx, wy)) in corners.iter().zip(world.iter()) {
            a.push(vec![x, y, 1.0, 0.0, 0.0, 0.0, -wx * x, -wx * y]);
            b.push(wx);
            a.push(vec![0.0, 0.0, 0.0, x, y, 1.0, -wy * x, -wy * y]);
            b.push(wy);
        }

        let h = solve_linear_system(&a, &b)
            .filter(|h| h.iter().all(|v| v.is_finite()))
            .ok_or_else(|| EngineError::degenerate_calibration("corners are collinear or coincident"))?;

        let calibration = Self {
            h: [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], 1.0]],
        };

        // every corner must land in front of the camera
        if corners.iter().any(|&(x, y)| calibration.to_world(x, y).is_none()) {
            return Err(EngineError::degenerate_calibration("corner maps to infinity"));
        }
        Ok(calibration)
    }

    /// Parse `x1,y1,x2,y2,x3,y3,x4,y4`.
    pub fn parse(corners: &str) -> EngineResult<Self> {
        let values: Vec<f64> = corners
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| EngineError::InvalidInput(format!("calibration: {e}")))?;
        if values.len() != 8 {
            return Err(EngineError::InvalidInput(format!(
                "calibration needs 8 numbers, got {}",
                values.len()
            )));
        }
        Self::from_corners([
            (values[0], values[1]),
            (values[2], values[3]),
            (values[4], values[5]),
            (values[6], values[7]),
        ])
    }

    /// Project a pixel onto the pitch plane, metres.
    pub fn to_world(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let h = &self.h;
        let w = h[2][0] * x + h[2][1] * y + h[2][2];
        if w.abs() < 1e-12 {
            return None;
        }
        let wx = (h[0][0] * x + h[0][1] * y + h[0][2]) / w;
        let wy = (h[1][0] * x + h[1][1] * y + h[1][2]) / w;
        (wx.is_finite() && wy.is_finite()).then_some((wx, wy))
    }

    /// Ground distance in metres between two pixels.
    pub fn metres_between(&self, a: (f64, f64), b: (f64, f64)) -> Option<f64> {
        let (ax, ay) = self.to_world(a.0, a.1)?;
        let (bx, by) = self.to_world(b.0, b.1)?;
        Some((ax - bx).hypot(ay - by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle() -> PitchCorners {
        [(100.0, 100.0), (200.0, 100.0), (200.0, 760.0), (100.0, 760.0)]
    }

    #[test]
    fn test_axis_aligned_rectangle() {
        let cal = PitchCalibration::from_corners(rectangle()).unwrap();
        let (x, y) = cal.to_world(150.0, 430.0).unwrap();
        assert!((x - PITCH_WIDTH_M / 2.0).abs() < 1e-6);
        assert!((y - PITCH_LENGTH_M / 2.0).abs() < 1e-6);

        let d = cal.metres_between((100.0, 100.0), (100.0, 760.0)).unwrap();
        assert!((d - PITCH_LENGTH_M).abs() < 1e-6);
    }

    #[test]
    fn test_perspective_trapezoid() {
        // far end narrower than near end, as seen from behind the bowler
        let corners = [(560.0, 600.0), (720.0, 600.0), (680.0, 200.0), (600.0, 200.0)];
        let cal = PitchCalibration::from_corners(corners).unwrap();
        for (corner, expected) in corners.iter().zip([
            (0.0, 0.0),
            (PITCH_WIDTH_M, 0.0),
            (PITCH_WIDTH_M, PITCH_LENGTH_M),
            (0.0, PITCH_LENGTH_M),
        ]) {
            let (x, y) = cal.to_world(corner.0, corner.1).unwrap();
            assert!((x - expected.0).abs() < 1e-6 && (y - expected.1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_collinear_corners_rejected() {
        let corners = [(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)];
        assert!(matches!(
            PitchCalibration::from_corners(corners),
            Err(EngineError::DegenerateCalibration(_))
        ));
    }

    #[test]
    fn test_parse() {
        let cal = PitchCalibration::parse("100,100, 200,100, 200,760, 100,760").unwrap();
        assert_eq!(cal, PitchCalibration::from_corners(rectangle()).unwrap());

        assert!(matches!(PitchCalibration::parse("1,2,3"), Err(EngineError::InvalidInput(_))));
        assert!(PitchCalibration::parse("a,b,c,d,e,f,g,h").is_err());
    }
}
