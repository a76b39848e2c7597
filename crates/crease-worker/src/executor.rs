//! Bounded concurrent delivery execution.
//!
//! Deliveries share nothing, so a batch fans out across tasks limited by a
//! semaphore. Each delivery has its own timeout and its own result: one
//! failure never affects another.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crease_models::Position;

use crate::analyzer::{AnalysisOptions, DeliveryAnalyzer, DeliveryReport, PositionsFile};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

/// One unit of work.
#[derive(Debug, Clone)]
pub enum DeliveryJob {
    /// Decode and analyse a clip, optionally replaying known positions.
    Video {
        path: PathBuf,
        options: AnalysisOptions,
        positions: Option<Vec<Position>>,
    },
    /// Analyse precomputed positions only.
    Positions { file: PositionsFile, options: AnalysisOptions },
}

impl DeliveryJob {
    pub fn video(path: impl Into<PathBuf>, options: AnalysisOptions) -> Self {
        Self::Video {
            path: path.into(),
            options,
            positions: None,
        }
    }

    fn label(&self) -> String {
        match self {
            DeliveryJob::Video { path, .. } => path.display().to_string(),
            DeliveryJob::Positions { .. } => "positions".to_string(),
        }
    }
}

/// Runs deliveries with bounded concurrency and a per-delivery timeout.
#[derive(Clone)]
pub struct DeliveryExecutor {
    analyzer: Arc<DeliveryAnalyzer>,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
}

impl DeliveryExecutor {
    pub fn new(analyzer: DeliveryAnalyzer, max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    pub fn from_config(analyzer: DeliveryAnalyzer, config: &WorkerConfig) -> Self {
        Self::new(analyzer, config.max_concurrent, config.analysis_timeout)
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run one delivery. Waiting for a permit does not count against the timeout.
    pub async fn run(&self, job: DeliveryJob) -> WorkerResult<DeliveryReport> {
        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::task_failed("Semaphore closed"))?;

        let label = job.label();
        debug!(source = %label, "Delivery started");

        let analyzer = Arc::clone(&self.analyzer);
        let work = async move {
            match job {
                DeliveryJob::Video {
                    path,
                    options,
                    positions,
                } => analyzer.analyze_video(&path, &options, positions).await,
                DeliveryJob::Positions { file, options } => {
                    tokio::task::spawn_blocking(move || analyzer.analyze_positions(file, &options))
                        .await
                        .map_err(|e| WorkerError::task_failed(format!("Analysis task panicked: {}", e)))
                }
            }
        };

        let result = match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(self.timeout.as_secs())),
        };

        match &result {
            Ok(report) => info!(
                source = %label,
                delivery_id = %report.delivery_id,
                status = ?report.analysis.status,
                "Delivery finished"
            ),
            Err(e) => {
                error!(source = %label, code = %e.boundary_code(), "Delivery failed: {}", e);
                metrics::record_failure(e.boundary_code().as_str());
            }
        }
        result
    }

    /// Run a batch concurrently. Results come back in input order.
    pub async fn run_batch(&self, jobs: Vec<DeliveryJob>) -> Vec<WorkerResult<DeliveryReport>> {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let executor = self.clone();
                tokio::spawn(async move { executor.run(job).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(
                handle
                    .await
                    .unwrap_or_else(|e| Err(WorkerError::task_failed(format!("Delivery task panicked: {}", e)))),
            );
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crease_engine::EngineConfig;
    use crease_models::{AnalysisStatus, RawPosition};

    fn positions_job(points: usize) -> DeliveryJob {
        let positions = (0..points)
            .map(|i| {
                let f = i as f64;
                let y = if i <= 20 { 50.0 + 15.0 * f } else { 350.0 - 10.0 * (f - 20.0) };
                RawPosition::Object {
                    x: 100.0 + 5.0 * f,
                    y,
                    frame: Some(i as u32),
                }
            })
            .collect();
        DeliveryJob::Positions {
            file: PositionsFile {
                fps: 30.0,
                width: 640,
                height: 480,
                positions,
            },
            options: AnalysisOptions::default(),
        }
    }

    fn executor(timeout: Duration) -> DeliveryExecutor {
        DeliveryExecutor::new(DeliveryAnalyzer::new(EngineConfig::default()), 2, timeout)
    }

    #[tokio::test]
    async fn test_batch_results_keep_input_order() {
        let jobs = vec![
            positions_job(40),
            DeliveryJob::video("/nonexistent/clip.mp4", AnalysisOptions::default()),
            positions_job(3),
        ];

        let results = executor(Duration::from_secs(30)).run_batch(jobs).await;
        assert_eq!(results.len(), 3);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.analysis.status, AnalysisStatus::Complete);
        assert_eq!(first.frames, 40);

        assert!(matches!(results[1], Err(WorkerError::Media(_))));

        let third = results[2].as_ref().unwrap();
        assert_eq!(third.analysis.status, AnalysisStatus::TrackingFailed);
    }

    #[tokio::test]
    async fn test_zero_timeout_reports_timeout() {
        let err = executor(Duration::ZERO).run(positions_job(40)).await.unwrap_err();
        assert!(matches!(err, WorkerError::Timeout(0)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_permits_are_released() {
        let exec = executor(Duration::from_secs(30));
        assert_eq!(exec.available_permits(), 2);
        exec.run(positions_job(10)).await.unwrap();
        assert_eq!(exec.available_permits(), 2);
    }
}
