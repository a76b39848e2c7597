//! Acoustic transient (edge) detection.
//!
//! The signal is band-limited to the range where bat-on-ball impacts carry
//! most of their energy, split into short windows, and each window's energy is
//! scored against a median baseline. Windows whose robust z-score clears an
//! adaptive threshold are spikes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crease_models::AudioSpike;

use super::filter::BandPass;
use super::AudioTrack;

pub const DEFAULT_BAND_LOW_HZ: f64 = 1_500.0;
pub const DEFAULT_BAND_HIGH_HZ: f64 = 6_000.0;
pub const DEFAULT_WINDOW_MS: f64 = 8.0;
/// Base z-score a window must clear before adaptive scaling.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.8;
/// Upper bound on the adaptive multiplier's variance term.
pub const DEFAULT_MAX_VARIANCE_SCALE: f64 = 1.0;
/// Fewer windows than this cannot support a baseline.
pub const MIN_WINDOWS: usize = 6;
/// Strength of a spike that only just reaches the threshold.
pub const MIN_SPIKE_STRENGTH: f64 = 0.05;
const MIN_WINDOW_SAMPLES: usize = 16;
const MAD_TO_SIGMA: f64 = 1.4826;

/// Spike detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub window_ms: f64,
    pub z_threshold: f64,
    /// The threshold is multiplied by `1 + min(spread / baseline, max_variance_scale)`.
    pub max_variance_scale: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            band_low_hz: DEFAULT_BAND_LOW_HZ,
            band_high_hz: DEFAULT_BAND_HIGH_HZ,
            window_ms: DEFAULT_WINDOW_MS,
            z_threshold: DEFAULT_Z_THRESHOLD,
            max_variance_scale: DEFAULT_MAX_VARIANCE_SCALE,
        }
    }
}

impl SpikeConfig {
    pub fn with_z_threshold(mut self, z: f64) -> Self {
        self.z_threshold = z;
        self
    }

    pub fn with_window_ms(mut self, ms: f64) -> Self {
        self.window_ms = ms;
        self
    }
}

/// Outcome of spike detection on one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeReport {
    pub spike: AudioSpike,
    /// Highest window z-score observed.
    pub peak_z: f64,
    /// Adaptive threshold that was applied.
    pub threshold: f64,
    pub baseline: f64,
    pub windows: usize,
}

impl SpikeReport {
    fn empty(windows: usize) -> Self {
        Self {
            spike: AudioSpike::silent(),
            peak_z: 0.0,
            threshold: 0.0,
            baseline: 0.0,
            windows,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpikeDetector {
    config: SpikeConfig,
}

impl SpikeDetector {
    pub fn new(config: SpikeConfig) -> Self {
        Self { config }
    }

    /// Band-limited energy per window (RMS of the filtered signal).
    pub fn window_energies(&self, track: &AudioTrack) -> Vec<f64> {
        if track.sample_rate == 0 || track.samples.is_empty() {
            return Vec::new();
        }

        let window = self.window_samples(track.sample_rate);
        let filtered = BandPass::new(
            self.config.band_low_hz,
            self.config.band_high_hz,
            track.sample_rate,
        )
        .apply(&track.samples);

        filtered
            .chunks_exact(window)
            .map(|w| (w.iter().map(|v| v * v).sum::<f64>() / w.len() as f64).sqrt())
            .collect()
    }

    pub fn detect(&self, track: &AudioTrack) -> SpikeReport {
        let energies = self.window_energies(track);
        if energies.len() < MIN_WINDOWS {
            return SpikeReport::empty(energies.len());
        }

        let baseline = median(&energies);
        let deviations: Vec<f64> = energies.iter().map(|e| (e - baseline).abs()).collect();
        let spread = (MAD_TO_SIGMA * median(&deviations)).max(baseline * 0.05).max(1e-9);

        let variance_scale = (spread / baseline.max(1e-9)).min(self.config.max_variance_scale);
        let threshold = self.config.z_threshold * (1.0 + variance_scale);

        let window_ms = self.window_samples(track.sample_rate) as f64 * 1000.0 / track.sample_rate as f64;
        let mut peak_z = f64::MIN;
        let mut times_ms = Vec::new();
        for (i, e) in energies.iter().enumerate() {
            let z = (e - baseline) / spread;
            peak_z = peak_z.max(z);
            if z >= threshold {
                times_ms.push(i as f64 * window_ms);
            }
        }

        let present = !times_ms.is_empty();
        let strength = spike_strength(present, peak_z, threshold);

        debug!(
            windows = energies.len(),
            baseline,
            threshold,
            peak_z,
            spikes = times_ms.len(),
            "Audio spike scan"
        );

        SpikeReport {
            spike: AudioSpike {
                present,
                strength,
                times_ms,
            },
            peak_z,
            threshold,
            baseline,
            windows: energies.len(),
        }
    }

    fn window_samples(&self, sample_rate: u32) -> usize {
        ((self.config.window_ms / 1000.0) * sample_rate as f64).round().max(MIN_WINDOW_SAMPLES as f64) as usize
    }
}

/// Any window at or above the threshold yields a positive strength.
fn spike_strength(crossed: bool, peak_z: f64, threshold: f64) -> f64 {
    if !crossed {
        return 0.0;
    }
    (1.0 - threshold / peak_z).clamp(MIN_SPIKE_STRENGTH, 1.0)
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
