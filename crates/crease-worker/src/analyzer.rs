//! Video to delivery analysis.
//!
//! Decoding is async (FFmpeg subprocesses). Detection, tracking, spike
//! detection and the engine are CPU-bound and run on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crease_engine::{analyze_delivery, BatterHand, CameraOrientation, DeliveryInput, EngineConfig, PitchCalibration};
use crease_media::audio::waveform::DEFAULT_MAX_POINTS;
use crease_media::audio::DEFAULT_SAMPLE_RATE;
use crease_media::{
    decode_frames, extract_audio, split_deliveries, track_ball, AudioTrack, BallDetector, DeliverySegment,
    FrameSequence, MediaError, MotionDetector, MotionDetectorConfig, ReplayDetector, SegmentConfig, SourceConfig,
    SpikeConfig, SpikeDetector, TrackerConfig, Waveform,
};
use crease_models::{AudioSpike, DeliveryAnalysis, FrameSize, Position, RawPosition};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::DeliveryLogger;
use crate::metrics;

/// Frame cap when splitting a whole net session rather than one delivery.
pub const SPLIT_MAX_FRAMES: usize = 9000;

/// Caller-supplied facts about a delivery.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub fps: Option<f64>,
    pub orientation: CameraOrientation,
    pub batter: BatterHand,
    /// Pitch corners in analysed-frame pixel coordinates.
    pub calibration: Option<PitchCalibration>,
    pub direct_stump_hit: bool,
}

impl AnalysisOptions {
    fn input(&self, positions: Vec<Position>, fps: f64, size: FrameSize, audio: Option<AudioSpike>) -> DeliveryInput {
        let mut input = DeliveryInput::new(positions, fps, size)
            .with_orientation(self.orientation)
            .with_batter(self.batter)
            .with_direct_stump_hit(self.direct_stump_hit);
        if let Some(calibration) = self.calibration {
            input = input.with_calibration(calibration);
        }
        if let Some(audio) = audio {
            input = input.with_audio(audio);
        }
        input
    }
}

/// Precomputed ball positions, e.g. from an external detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsFile {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub positions: Vec<RawPosition>,
}

impl PositionsFile {
    pub async fn load(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Analysis plus display-only extras.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub delivery_id: String,
    #[serde(flatten)]
    pub analysis: DeliveryAnalysis,
    pub waveform: Option<Waveform>,
    pub frames: usize,
    pub fps: f64,
}

/// Everything needed to turn a clip into a [`DeliveryReport`].
#[derive(Debug, Clone)]
pub struct DeliveryAnalyzer {
    engine: Arc<EngineConfig>,
    source: SourceConfig,
    detector: MotionDetectorConfig,
    tracker: TrackerConfig,
    spike: SpikeConfig,
    segment: SegmentConfig,
}

impl DeliveryAnalyzer {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            source: SourceConfig::default(),
            detector: MotionDetectorConfig::default(),
            tracker: TrackerConfig::default(),
            spike: SpikeConfig::default(),
            segment: SegmentConfig::default(),
        }
    }

    pub fn with_source_config(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    pub fn with_detector_config(mut self, detector: MotionDetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_max_video_bytes(mut self, bytes: u64) -> Self {
        self.source.max_input_bytes = bytes;
        self
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    async fn check_video(&self, path: &Path) -> WorkerResult<()> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| MediaError::FileNotFound(path.to_path_buf()))?;
        if meta.len() == 0 {
            return Err(MediaError::invalid_video("Empty video file").into());
        }
        if meta.len() > self.source.max_input_bytes {
            return Err(MediaError::ResourceLimit(format!(
                "video is {} bytes, limit is {}",
                meta.len(),
                self.source.max_input_bytes
            ))
            .into());
        }
        Ok(())
    }

    /// Decode a clip and analyse it.
    ///
    /// With `positions`, detection is replayed from them instead of running
    /// the motion detector; the clip still provides timing and audio.
    pub async fn analyze_video(
        &self,
        path: impl AsRef<Path>,
        options: &AnalysisOptions,
        positions: Option<Vec<Position>>,
    ) -> WorkerResult<DeliveryReport> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let logger = DeliveryLogger::new(path.display().to_string());
        self.check_video(&path).await?;

        logger.log_start("decode");
        let started = Instant::now();
        let source = self.source.clone().with_fps_override(options.fps);
        let frames = decode_frames(&path, &source).await.inspect_err(|e| {
            logger.log_error("decode", &e.to_string());
        })?;
        let audio = match extract_audio(&path, DEFAULT_SAMPLE_RATE, source.timeout_secs).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(delivery_id = logger.delivery_id(), error = %e, "Audio extraction failed, continuing without audio");
                None
            }
        };
        metrics::record_stage_duration("decode", started.elapsed().as_secs_f64());
        logger.log_completion("decode", started.elapsed().as_millis());

        let analyzer = self.clone();
        let options = options.clone();
        let report = tokio::task::spawn_blocking(move || {
            analyzer.analyze_frames(&frames, audio.as_ref(), &options, positions.as_deref(), &logger)
        })
        .await
        .map_err(|e| WorkerError::task_failed(format!("Analysis task panicked: {}", e)))?;

        metrics::record_analysis(&report.analysis);
        Ok(report)
    }

    /// Analyse already-decoded frames.
    pub fn analyze_frames(
        &self,
        frames: &FrameSequence,
        audio: Option<&AudioTrack>,
        options: &AnalysisOptions,
        positions: Option<&[Position]>,
        logger: &DeliveryLogger,
    ) -> DeliveryReport {
        logger.log_start("track");
        let started = Instant::now();
        let mut detector: Box<dyn BallDetector> = match positions {
            Some(positions) => Box::new(ReplayDetector::from_positions(positions)),
            None => Box::new(MotionDetector::new(self.detector.clone())),
        };
        let tracked = track_ball(detector.as_mut(), frames, &self.tracker);
        metrics::record_stage_duration("track", started.elapsed().as_secs_f64());
        logger.log_completion("track", started.elapsed().as_millis());

        let (spike, waveform) = match audio.filter(|a| !a.is_empty()) {
            Some(track) => {
                let report = SpikeDetector::new(self.spike.clone()).detect(track);
                let waveform = crease_media::audio::build_waveform(track, DEFAULT_MAX_POINTS);
                (Some(report.spike), Some(waveform))
            }
            None => (None, None),
        };

        let input = options.input(tracked, frames.fps, frames.size, spike);
        let analysis = self.run_engine(&input, logger);

        DeliveryReport {
            delivery_id: logger.delivery_id().to_string(),
            analysis,
            waveform,
            frames: frames.len(),
            fps: frames.fps,
        }
    }

    /// Analyse precomputed positions without any media.
    pub fn analyze_positions(&self, file: PositionsFile, options: &AnalysisOptions) -> DeliveryReport {
        let logger = DeliveryLogger::new("positions");
        let fps = options.fps.unwrap_or(file.fps);
        let size = FrameSize::new(file.width, file.height);
        let input = options.input(crease_models::normalize_positions(file.positions), fps, size, None);
        let frames = input.positions.len();

        let analysis = self.run_engine(&input, &logger);
        metrics::record_analysis(&analysis);

        DeliveryReport {
            delivery_id: logger.delivery_id().to_string(),
            analysis,
            waveform: None,
            frames,
            fps,
        }
    }

    fn run_engine(&self, input: &DeliveryInput, logger: &DeliveryLogger) -> DeliveryAnalysis {
        logger.log_start("analyze");
        let started = Instant::now();
        let analysis = analyze_delivery(input, &self.engine);
        metrics::record_stage_duration("analyze", started.elapsed().as_secs_f64());

        match analysis.status.boundary_code() {
            Some(code) => logger.log_insufficient("analyze", code.as_str()),
            None => logger.log_completion("analyze", started.elapsed().as_millis()),
        }
        analysis
    }

    /// Split a longer clip into individual deliveries.
    pub async fn split_video(&self, path: impl AsRef<Path>) -> WorkerResult<Vec<DeliverySegment>> {
        let path = path.as_ref();
        self.check_video(path).await?;

        let source = self.source.clone().with_max_frames(SPLIT_MAX_FRAMES);
        let frames = decode_frames(path, &source).await?;
        let segment = self.segment.clone();

        tokio::task::spawn_blocking(move || split_deliveries(&frames, &segment))
            .await
            .map_err(|e| WorkerError::task_failed(format!("Split task panicked: {}", e)))
    }
}
