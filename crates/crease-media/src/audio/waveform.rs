//! Display waveform for the acoustic edge graph.

use serde::{Deserialize, Serialize};

use super::AudioTrack;

/// RMS window length in milliseconds.
pub const WAVEFORM_WINDOW_MS: f64 = 2.0;
pub const DEFAULT_MAX_POINTS: usize = 500;
/// Peak-to-median ratio at which the waveform shows a spike.
pub const SPIKE_RATIO_THRESHOLD: f64 = 2.5;
const MIN_POINTS_FOR_RATIO: usize = 5;

/// Normalized RMS envelope plus a peak-to-baseline summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// RMS envelope scaled to `[0, 1]`.
    pub points: Vec<f32>,
    pub sample_rate: u32,
    /// Peak divided by median envelope value.
    pub spike_ratio: f64,
    pub spike_detected: bool,
    /// `spike_ratio` mapped to `[0, 1]`.
    pub confidence: f64,
}

/// Build the envelope, downsampled to at most `max_points` values.
pub fn build_waveform(track: &AudioTrack, max_points: usize) -> Waveform {
    let window = ((track.sample_rate as f64 * WAVEFORM_WINDOW_MS / 1000.0) as usize).max(1);

    let mut rms: Vec<f32> = track
        .samples
        .chunks_exact(window)
        .map(|w| (w.iter().map(|s| s * s).sum::<f32>() / w.len() as f32).sqrt())
        .collect();

    let max = rms.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        rms.iter_mut().for_each(|v| *v /= max);
    }

    let step = rms.len().div_ceil(max_points.max(1)).max(1);
    let points: Vec<f32> = rms.iter().step_by(step).copied().collect();
    let (spike_ratio, spike_detected, confidence) = ratio_spike(&points);

    Waveform {
        points,
        sample_rate: track.sample_rate,
        spike_ratio,
        spike_detected,
        confidence,
    }
}

fn ratio_spike(points: &[f32]) -> (f64, bool, f64) {
    if points.len() < MIN_POINTS_FOR_RATIO {
        return (0.0, false, 0.0);
    }

    let mut sorted: Vec<f64> = points.iter().map(|&p| p as f64).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let baseline = sorted[sorted.len() / 2];
    let peak = sorted[sorted.len() - 1];
    if baseline <= 0.0 {
        return (0.0, false, 0.0);
    }

    let ratio = peak / baseline;
    let confidence = (ratio / (SPIKE_RATIO_THRESHOLD * 2.0)).min(1.0);
    (ratio, ratio >= SPIKE_RATIO_THRESHOLD, confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_is_normalized_and_bounded() {
        let mut samples = vec![0.05f32; 44_100];
        for s in samples.iter_mut().skip(22_000).take(200) {
            *s = 0.9;
        }
        let wf = build_waveform(&AudioTrack::new(samples, 44_100), DEFAULT_MAX_POINTS);

        assert!(wf.points.len() <= DEFAULT_MAX_POINTS);
        assert!(wf.points.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(wf.spike_detected);
        assert!(wf.spike_ratio > 10.0);
        assert_eq!(wf.confidence, 1.0);
    }

    #[test]
    fn test_flat_waveform_has_no_spike() {
        let wf = build_waveform(&AudioTrack::new(vec![0.2; 44_100], 44_100), DEFAULT_MAX_POINTS);
        assert!(!wf.spike_detected);
        assert!((wf.spike_ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_track() {
        let wf = build_waveform(&AudioTrack::new(vec![], 44_100), DEFAULT_MAX_POINTS);
        assert!(wf.points.is_empty());
        assert!(!wf.spike_detected);
    }
}
