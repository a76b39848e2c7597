//! Prometheus metrics for delivery analysis.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crease_models::{AnalysisStatus, DeliveryAnalysis};

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const DELIVERIES_ANALYZED_TOTAL: &str = "crease_deliveries_analyzed_total";
    pub const DELIVERIES_FAILED_TOTAL: &str = "crease_deliveries_failed_total";
    pub const DECISIONS_TOTAL: &str = "crease_drs_decisions_total";
    pub const SPEED_ESTIMATES_TOTAL: &str = "crease_speed_estimates_total";
    pub const STAGE_DURATION_SECONDS: &str = "crease_stage_duration_seconds";
}

/// Install the Prometheus exporter on `0.0.0.0:port`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(port: u16) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        .install()
        .map_err(|e| WorkerError::config_error(format!("Failed to install Prometheus exporter: {}", e)))
}

fn status_label(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Complete => "complete",
        AnalysisStatus::BallNotDetected => "ball_not_detected",
        AnalysisStatus::TrackingFailed => "tracking_failed",
    }
}

/// Record a finished analysis.
pub fn record_analysis(analysis: &DeliveryAnalysis) {
    let labels = [("status", status_label(analysis.status).to_string())];
    counter!(names::DELIVERIES_ANALYZED_TOTAL, &labels).increment(1);

    if let Some(drs) = &analysis.drs {
        let labels = [("decision", drs.decision.as_str().to_string())];
        counter!(names::DECISIONS_TOTAL, &labels).increment(1);
    }

    let provenance = analysis
        .speed_provenance
        .map(|p| p.as_str())
        .unwrap_or("unavailable");
    let labels = [
        ("provenance", provenance.to_string()),
        ("degraded", analysis.speed_degraded.to_string()),
    ];
    counter!(names::SPEED_ESTIMATES_TOTAL, &labels).increment(1);
}

/// Record a delivery that failed with an error.
pub fn record_failure(code: &str) {
    let labels = [("code", code.to_string())];
    counter!(names::DELIVERIES_FAILED_TOTAL, &labels).increment(1);
}

/// Record a stage duration.
pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}
