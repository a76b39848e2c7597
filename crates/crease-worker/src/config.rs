//! Worker configuration.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use tracing::info;

use crease_engine::EngineConfig;

use crate::error::{WorkerError, WorkerResult};

/// Prefix for engine overrides, e.g. `CREASE_ENGINE__DRS__OUT_THRESHOLD=0.8`.
pub const ENGINE_ENV_PREFIX: &str = "CREASE_ENGINE";

pub const DEFAULT_MAX_CONCURRENT: usize = 2;
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 200 * 1024 * 1024;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum deliveries analysed at once
    pub max_concurrent: usize,
    /// Per-delivery timeout
    pub analysis_timeout: Duration,
    /// Uploads larger than this are rejected before decoding
    pub max_video_bytes: u64,
    /// Optional engine config file
    pub engine_config_path: Option<String>,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
    pub gemini_api_key: Option<String>,
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            engine_config_path: None,
            metrics_port: None,
            gemini_api_key: None,
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            max_concurrent: std::env::var("CREASE_MAX_CONCURRENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENT),
            analysis_timeout: Duration::from_secs(
                std::env::var("CREASE_ANALYSIS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_ANALYSIS_TIMEOUT_SECS),
            ),
            max_video_bytes: std::env::var("CREASE_MAX_VIDEO_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_VIDEO_BYTES),
            engine_config_path: non_empty("CREASE_ENGINE_CONFIG"),
            metrics_port: std::env::var("CREASE_METRICS_PORT").ok().and_then(|s| s.parse().ok()),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            jwt_secret: non_empty("JWT_SECRET"),
            jwt_issuer: non_empty("JWT_ISSUER"),
            jwt_audience: non_empty("JWT_AUDIENCE"),
        }
    }
}

/// Load the engine configuration.
///
/// Layers, lowest first: built-in defaults, the optional file, then
/// `CREASE_ENGINE__*` environment variables. The result is validated.
pub fn load_engine_config(path: Option<&Path>) -> WorkerResult<EngineConfig> {
    let defaults = Config::try_from(&EngineConfig::default())
        .map_err(|e| WorkerError::config_error(format!("Failed to encode defaults: {}", e)))?;

    let mut builder = Config::builder().add_source(defaults);
    if let Some(path) = path {
        info!(path = %path.display(), "Loading engine config file");
        builder = builder.add_source(File::from(path).required(true));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENGINE_ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let engine: EngineConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| WorkerError::config_error(format!("Failed to load engine config: {}", e)))?;

    engine.validate()?;
    Ok(engine)
}
