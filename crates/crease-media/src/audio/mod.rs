//! Audio extraction and acoustic edge evidence.

pub mod filter;
pub mod spike;
pub mod waveform;

use std::path::Path;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_video;

pub use spike::{SpikeConfig, SpikeDetector, SpikeReport};
pub use waveform::{build_waveform, Waveform};

/// Sample rate audio is resampled to before analysis.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Mono PCM samples.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioTrack {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Extract the clip's audio as mono f32 PCM.
///
/// Returns `Ok(None)` when the clip has no audio stream; acoustic evidence is
/// optional for every downstream stage.
pub async fn extract_audio(
    path: impl AsRef<Path>,
    sample_rate: u32,
    timeout_secs: u64,
) -> MediaResult<Option<AudioTrack>> {
    let path = path.as_ref();
    let info = probe_video(path).await?;
    if !info.has_audio {
        debug!(path = %path.display(), "Clip has no audio stream");
        return Ok(None);
    }

    let cmd = FfmpegCommand::new(path).raw_mono_f32(sample_rate);
    let raw = FfmpegRunner::new().with_timeout(timeout_secs).capture(&cmd).await?;
    let samples = parse_f32le(&raw);

    debug!(samples = samples.len(), sample_rate, "Extracted audio");
    Ok(Some(AudioTrack::new(samples, sample_rate)))
}

/// Decode little-endian f32 samples. A trailing partial sample is ignored.
pub fn parse_f32le(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
