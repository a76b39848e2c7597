//! Second-order IIR sections used to band-limit audio before energy analysis.

use std::f64::consts::PI;

const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Transposed direct form II biquad.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn from_coeffs(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn low_pass(cutoff_hz: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * BUTTERWORTH_Q);
        Self::from_coeffs(
            (1.0 - cos) / 2.0,
            1.0 - cos,
            (1.0 - cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    pub fn high_pass(cutoff_hz: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * BUTTERWORTH_Q);
        Self::from_coeffs(
            (1.0 + cos) / 2.0,
            -(1.0 + cos),
            (1.0 + cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// High-pass followed by low-pass, each a Butterworth biquad.
#[derive(Debug, Clone)]
pub struct BandPass {
    high_pass: Biquad,
    low_pass: Biquad,
}

impl BandPass {
    /// Build a band-pass. The upper edge is kept below Nyquist.
    pub fn new(low_hz: f64, high_hz: f64, sample_rate: u32) -> Self {
        let sr = sample_rate.max(1) as f64;
        let high = high_hz.min(sr * 0.45);
        let low = low_hz.min(high * 0.9).max(1.0);
        Self {
            high_pass: Biquad::high_pass(low, sr),
            low_pass: Biquad::low_pass(high, sr),
        }
    }

    pub fn process(&mut self, x: f64) -> f64 {
        self.low_pass.process(self.high_pass.process(x))
    }

    pub fn apply(&mut self, samples: &[f32]) -> Vec<f64> {
        samples.iter().map(|&s| self.process(s as f64)).collect()
    }
}
