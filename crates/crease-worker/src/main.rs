//! Delivery analysis worker binary.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crease_models::normalize_positions;
use crease_worker::cli::{parse_args, Command, USAGE};
use crease_worker::{
    load_engine_config, DeliveryAnalyzer, DeliveryExecutor, DeliveryJob, PositionsFile, WorkerConfig, WorkerError,
};

fn init_tracing() -> anyhow::Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("crease=info".parse()?);

    // stdout carries the JSON result, so logs go to stderr
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .try_init()?;
    }
    Ok(())
}

async fn run(command: Command, config: &WorkerConfig) -> Result<serde_json::Value, WorkerError> {
    let engine = load_engine_config(config.engine_config_path.as_deref().map(Path::new))?;
    let analyzer = DeliveryAnalyzer::new(engine).with_max_video_bytes(config.max_video_bytes);

    match command {
        Command::Analyze {
            video,
            positions,
            options,
        } => {
            let positions = match positions {
                Some(path) => Some(PositionsFile::load(&path).await?),
                None => None,
            };
            let job = match (video, positions) {
                (Some(path), replay) => DeliveryJob::Video {
                    path,
                    options,
                    positions: replay.map(|file| normalize_positions(file.positions)),
                },
                (None, Some(file)) => DeliveryJob::Positions { file, options },
                (None, None) => return Err(WorkerError::invalid_input("nothing to analyse")),
            };

            let executor = DeliveryExecutor::from_config(analyzer, config);
            let report = executor.run(job).await?;
            Ok(serde_json::to_value(&report)?)
        }
        Command::Split { video } => {
            let segments = analyzer.split_video(&video).await?;
            info!(segments = segments.len(), "Split complete");
            Ok(serde_json::to_value(&segments)?)
        }
        Command::Help => Ok(serde_json::Value::Null),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing().context("Failed to initialise tracing")?;

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(ExitCode::SUCCESS);
        }
        Ok(command) => command,
        Err(message) => {
            eprintln!("error: {}\n\n{}", message, USAGE);
            return Ok(ExitCode::from(2));
        }
    };

    let config = WorkerConfig::from_env();
    if let Some(port) = config.metrics_port {
        crease_worker::metrics::init_metrics(port)?;
        info!(port, "Prometheus exporter listening");
    }

    match run(command, &config).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let code = e.boundary_code();
            error!(code = %code, retryable = e.is_retryable(), "{}", e);
            let body = serde_json::json!({
                "error": code.as_str(),
                "message": e.to_string(),
                "retryable": e.is_retryable(),
            });
            println!("{}", body);
            Ok(ExitCode::FAILURE)
        }
    }
}
