//! Positions-file analysis through the public worker API.

use std::io::Write;
use std::time::Duration;

use crease_engine::{CameraOrientation, EngineConfig};
use crease_models::{AnalysisStatus, Decision};
use crease_worker::{AnalysisOptions, DeliveryAnalyzer, DeliveryExecutor, DeliveryJob, PositionsFile};

/// Straight down the middle, pitching at frame 24 and carrying on into the stumps.
fn middle_stump_json(mirrored: bool) -> String {
    let points: Vec<String> = (0..32u32)
        .map(|i| {
            let y = if i <= 24 { 150.0 + 20.0 * i as f64 } else { 630.0 - 12.0 * (i - 24) as f64 };
            let x = if mirrored { 1280.0 - 640.0 } else { 640.0 };
            format!(r#"{{"x": {x}, "y": {y}, "frame": {i}}}"#)
        })
        .collect();
    format!(r#"{{"fps": 60, "width": 1280, "height": 720, "positions": [{}]}}"#, points.join(", "))
}

async fn load(json: &str) -> PositionsFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    PositionsFile::load(file.path()).await.unwrap()
}

#[tokio::test]
async fn test_positions_file_to_decision() {
    let file = load(&middle_stump_json(false)).await;
    let executor = DeliveryExecutor::new(DeliveryAnalyzer::new(EngineConfig::default()), 1, Duration::from_secs(10));

    let report = executor
        .run(DeliveryJob::Positions {
            file,
            options: AnalysisOptions::default(),
        })
        .await
        .unwrap();

    assert_eq!(report.analysis.status, AnalysisStatus::Complete);
    assert_eq!(report.analysis.bounce_point.map(|p| p.frame), Some(24));
    assert_eq!(report.analysis.drs.as_ref().map(|d| d.decision), Some(Decision::Out));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["drs"]["decision"], "OUT");
    assert_eq!(json["delivery_id"], report.delivery_id.as_str());
}

#[tokio::test]
async fn test_mirrored_flag_is_honoured() {
    let file = load(&middle_stump_json(true)).await;
    let options = AnalysisOptions {
        orientation: CameraOrientation::Mirrored,
        ..AnalysisOptions::default()
    };
    let report = DeliveryAnalyzer::new(EngineConfig::default()).analyze_positions(file, &options);
    assert_eq!(report.analysis.drs.map(|d| d.decision), Some(Decision::Out));
}

#[tokio::test]
async fn test_malformed_positions_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"fps\": 30}").unwrap();
    let err = PositionsFile::load(file.path()).await.unwrap_err();
    assert_eq!(err.boundary_code().as_str(), "INVALID_VIDEO");
}
