//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use crease_models::BoundaryCode;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while decoding or analysing media.
///
/// A clip where no ball is visible is not an error: detectors and trackers
/// return empty results for that case.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Insufficient frames: decoded {decoded}, need at least {required}")]
    InsufficientFrames { decoded: usize, required: usize },

    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid video error.
    pub fn invalid_video(message: impl Into<String>) -> Self {
        Self::InvalidVideo(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Boundary code reported to callers.
    pub fn boundary_code(&self) -> BoundaryCode {
        match self {
            MediaError::InsufficientFrames { .. } => BoundaryCode::InsufficientFrames,
            MediaError::InvalidVideo(_)
            | MediaError::FileNotFound(_)
            | MediaError::FfmpegFailed { .. }
            | MediaError::FfprobeFailed { .. }
            | MediaError::JsonParse(_)
            | MediaError::ResourceLimit(_) => BoundaryCode::InvalidVideo,
            MediaError::Timeout(_) => BoundaryCode::Timeout,
            MediaError::FfmpegNotFound
            | MediaError::FfprobeNotFound
            | MediaError::Io(_)
            | MediaError::DetectionFailed(_)
            | MediaError::Internal(_) => BoundaryCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_codes() {
        let err = MediaError::InsufficientFrames { decoded: 3, required: 6 };
        assert_eq!(err.boundary_code(), BoundaryCode::InsufficientFrames);
        assert_eq!(MediaError::invalid_video("no stream").boundary_code(), BoundaryCode::InvalidVideo);
        assert_eq!(MediaError::Timeout(30).boundary_code(), BoundaryCode::Timeout);
        assert!(err.to_string().contains("need at least 6"));
    }
}
