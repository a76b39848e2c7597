//! Frame source: decode a delivery clip into grayscale frames.

use image::GrayImage;
use std::path::Path;
use tracing::{debug, info};

use crease_models::FrameSize;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameSequence};
use crate::probe::probe_video;

/// Width every clip is scaled to. Detector thresholds are tuned for it.
pub const DEFAULT_TARGET_WIDTH: u32 = 640;
/// Frames decoded per delivery.
pub const DEFAULT_MAX_FRAMES: usize = 120;
/// Fewer decoded frames than this is an input defect.
pub const DEFAULT_MIN_FRAMES: usize = 6;
pub const DEFAULT_MIN_FPS: f64 = 24.0;
pub const DEFAULT_MAX_FPS: f64 = 60.0;
/// Used when neither an override nor the container gives a frame rate.
pub const FALLBACK_FPS: f64 = 30.0;
pub const DEFAULT_DECODE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 200 * 1024 * 1024;

/// Frame source settings.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub target_width: u32,
    pub max_frames: usize,
    pub min_frames: usize,
    /// Timing frame rate is clamped into `[min_fps, max_fps]`.
    pub min_fps: f64,
    pub max_fps: f64,
    /// Caller-supplied frame rate, preferred over the container's.
    pub fps_override: Option<f64>,
    pub timeout_secs: u64,
    pub max_input_bytes: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_WIDTH,
            max_frames: DEFAULT_MAX_FRAMES,
            min_frames: DEFAULT_MIN_FRAMES,
            min_fps: DEFAULT_MIN_FPS,
            max_fps: DEFAULT_MAX_FPS,
            fps_override: None,
            timeout_secs: DEFAULT_DECODE_TIMEOUT_SECS,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl SourceConfig {
    pub fn with_fps_override(mut self, fps: Option<f64>) -> Self {
        self.fps_override = fps;
        self
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = width;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Frame rate used for timing: override, then probed, then fallback; clamped.
    pub fn resolve_fps(&self, probed: Option<f64>) -> f64 {
        let valid = |f: &f64| f.is_finite() && *f > 0.0;
        self.fps_override
            .filter(valid)
            .or(probed.filter(valid))
            .unwrap_or(FALLBACK_FPS)
            .clamp(self.min_fps, self.max_fps)
    }

    /// Output size after scaling to the target width. Height is kept even.
    pub fn scaled_size(&self, width: u32, height: u32) -> FrameSize {
        let target_w = self.target_width.max(2);
        let h = (height as f64 * target_w as f64 / width.max(1) as f64).round() as u32;
        FrameSize::new(target_w, (h.max(2) / 2) * 2)
    }
}

/// Decode a clip on disk.
pub async fn decode_frames(path: impl AsRef<Path>, config: &SourceConfig) -> MediaResult<FrameSequence> {
    let path = path.as_ref();
    let info = probe_video(path).await?;
    let fps = config.resolve_fps(info.fps);
    let size = config.scaled_size(info.width, info.height);

    debug!(
        path = %path.display(),
        source_width = info.width,
        source_height = info.height,
        probed_fps = ?info.fps,
        fps,
        "Decoding delivery frames"
    );

    let cmd = FfmpegCommand::new(path)
        .video_filter(format!("scale={}:{}", size.width, size.height))
        .frame_limit(config.max_frames)
        .raw_gray_video();

    let raw = FfmpegRunner::new()
        .with_timeout(config.timeout_secs)
        .capture(&cmd)
        .await?;

    let sequence = frames_from_raw(&raw, size, fps, config)?;
    info!(frames = sequence.len(), fps, width = size.width, height = size.height, "Decoded delivery frames");
    Ok(sequence)
}

/// Decode a clip held in memory. The bytes are spooled to a temp file for FFmpeg.
pub async fn decode_bytes(bytes: &[u8], config: &SourceConfig) -> MediaResult<FrameSequence> {
    if bytes.is_empty() {
        return Err(MediaError::invalid_video("Empty video payload"));
    }
    if bytes.len() as u64 > config.max_input_bytes {
        return Err(MediaError::ResourceLimit(format!(
            "video payload is {} bytes, limit is {}",
            bytes.len(),
            config.max_input_bytes
        )));
    }

    let tmp = tempfile::Builder::new().prefix("crease-").tempfile()?;
    tokio::fs::write(tmp.path(), bytes).await?;
    decode_frames(tmp.path(), config).await
}

/// Split raw `gray` rawvideo bytes into frames.
pub fn frames_from_raw(raw: &[u8], size: FrameSize, fps: f64, config: &SourceConfig) -> MediaResult<FrameSequence> {
    let frame_len = size.width as usize * size.height as usize;
    if frame_len == 0 {
        return Err(MediaError::invalid_video("Zero-sized frames"));
    }

    let remainder = raw.len() % frame_len;
    if remainder != 0 {
        debug!(trailing_bytes = remainder, "Dropping partial trailing frame");
    }

    let frames: Vec<Frame> = raw
        .chunks_exact(frame_len)
        .take(config.max_frames)
        .enumerate()
        .filter_map(|(i, chunk)| {
            GrayImage::from_raw(size.width, size.height, chunk.to_vec())
                .map(|image| Frame::new(i as u32, i as f64 * 1000.0 / fps, image))
        })
        .collect();

    if frames.len() < config.min_frames {
        return Err(MediaError::InsufficientFrames {
            decoded: frames.len(),
            required: config.min_frames,
        });
    }

    Ok(FrameSequence { frames, fps, size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fps() {
        let config = SourceConfig::default();
        assert_eq!(config.resolve_fps(Some(30.0)), 30.0);
        assert_eq!(config.resolve_fps(Some(240.0)), 60.0);
        assert_eq!(config.resolve_fps(Some(12.0)), 24.0);
        assert_eq!(config.resolve_fps(None), FALLBACK_FPS);

        let config = config.with_fps_override(Some(50.0));
        assert_eq!(config.resolve_fps(Some(30.0)), 50.0);

        let config = SourceConfig::default().with_fps_override(Some(f64::NAN));
        assert_eq!(config.resolve_fps(Some(25.0)), 25.0);
    }

    #[test]
    fn test_scaled_size_keeps_aspect() {
        let config = SourceConfig::default();
        assert_eq!(config.scaled_size(1920, 1080), FrameSize::new(640, 360));
        assert_eq!(config.scaled_size(1080, 1920), FrameSize::new(640, 1138));
    }

    #[test]
    fn test_frames_from_raw() {
        let size = FrameSize::new(4, 2);
        let raw = vec![7u8; 8 * 10 + 3];
        let config = SourceConfig::default().with_max_frames(8);

        let seq = frames_from_raw(&raw, size, 25.0, &config).unwrap();
        assert_eq!(seq.len(), 8);
        assert_eq!(seq.frames[1].image.get_pixel(3, 1).0[0], 7);
        assert!((seq.frames[1].timestamp_ms - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_frames_from_raw_too_short() {
        let size = FrameSize::new(4, 2);
        let raw = vec![0u8; 8 * 3];
        let err = frames_from_raw(&raw, size, 30.0, &SourceConfig::default()).unwrap_err();
        assert!(matches!(err, MediaError::InsufficientFrames { decoded: 3, required: 6 }));
    }

    #[tokio::test]
    async fn test_decode_bytes_rejects_empty() {
        let err = decode_bytes(&[], &SourceConfig::default()).await.unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[test]
    fn test_decode_bytes_rejects_oversized_payload() {
        let mut config = SourceConfig::default();
        config.max_input_bytes = 4;
        let err = tokio_test::block_on(decode_bytes(&[1, 2, 3, 4, 5], &config)).unwrap_err();
        assert!(matches!(err, MediaError::ResourceLimit(_)));
    }
}
