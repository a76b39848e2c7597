//! Media front-end for delivery analysis.
//!
//! This crate provides:
//! - FFmpeg/FFprobe wrappers that decode clips into grayscale frames and mono audio
//! - Audio spike (acoustic edge) detection and waveform rendering
//! - Ball detection behind the [`BallDetector`] capability trait
//! - A greedy nearest-neighbour ball tracker
//! - Delivery segmentation of longer clips

pub mod audio;
pub mod command;
pub mod detection;
pub mod error;
pub mod frame;
pub mod probe;
pub mod segment;
pub mod source;
pub mod tracker;

pub use audio::{extract_audio, AudioTrack, SpikeConfig, SpikeDetector, SpikeReport, Waveform};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use detection::{BallDetector, Candidate, CircleDetector, MotionDetector, MotionDetectorConfig, ReplayDetector};
pub use error::{MediaError, MediaResult};
pub use frame::{Frame, FrameSequence};
pub use probe::{probe_video, VideoInfo};
pub use segment::{split_deliveries, DeliverySegment, SegmentConfig};
pub use source::{decode_bytes, decode_frames, SourceConfig};
pub use tracker::{track_ball, GreedyBallTracker, TrackerConfig};
