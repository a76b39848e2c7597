//! Worker error types.

use thiserror::Error;

use crease_engine::EngineError;
use crease_media::MediaError;
use crease_models::BoundaryCode;
use crease_services::ServiceError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis timed out after {0} seconds")]
    Timeout(u64),

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn task_failed(msg: impl Into<String>) -> Self {
        Self::TaskFailed(msg.into())
    }

    /// Check if the caller may retry.
    ///
    /// Re-running the deterministic core on the same input gives the same
    /// answer, so only timeouts and collaborator transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Timeout(_) => true,
            WorkerError::Service(e) => e.is_retryable(),
            WorkerError::Media(MediaError::Timeout(_)) => true,
            _ => false,
        }
    }

    pub fn boundary_code(&self) -> BoundaryCode {
        match self {
            WorkerError::Media(e) => e.boundary_code(),
            WorkerError::Service(e) => e.boundary_code(),
            WorkerError::Timeout(_) => BoundaryCode::Timeout,
            WorkerError::InvalidInput(_) | WorkerError::Json(_) | WorkerError::Engine(EngineError::InvalidInput(_)) => {
                BoundaryCode::InvalidVideo
            }
            WorkerError::Engine(EngineError::DegenerateCalibration(_)) => BoundaryCode::InvalidVideo,
            WorkerError::ConfigError(_)
            | WorkerError::TaskFailed(_)
            | WorkerError::Engine(EngineError::InvalidConfig(_))
            | WorkerError::Io(_) => BoundaryCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_failures_are_not_retryable() {
        let err = WorkerError::from(MediaError::InsufficientFrames { decoded: 2, required: 6 });
        assert!(!err.is_retryable());
        assert_eq!(err.boundary_code(), BoundaryCode::InsufficientFrames);

        let err = WorkerError::from(MediaError::invalid_video("not a video"));
        assert!(!err.is_retryable());
        assert_eq!(err.boundary_code().as_str(), "INVALID_VIDEO");
    }

    #[test]
    fn test_timeouts_and_transport_failures_are_retryable() {
        assert!(WorkerError::Timeout(30).is_retryable());
        assert_eq!(WorkerError::Timeout(30).boundary_code(), BoundaryCode::Timeout);

        let err = WorkerError::from(ServiceError::unavailable("503"));
        assert!(err.is_retryable());
        assert_eq!(err.boundary_code(), BoundaryCode::ServiceUnavailable);

        let err = WorkerError::from(ServiceError::unauthenticated("bad token"));
        assert!(!err.is_retryable());
        assert_eq!(err.boundary_code(), BoundaryCode::Unauthenticated);
    }
}
