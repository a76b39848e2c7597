//! Delivery analysis core.
//!
//! Everything in this crate is a pure, synchronous function of its inputs:
//! no I/O, no shared state between deliveries. The stages are:
//!
//! - [`trajectory`]: jitter removal, smoothing, bounce split, quadratic fits, contact scan
//! - [`speed`]: windowed median speed with metric scaling and range checks
//! - [`classify`]: swing/spin categories with mirroring and batter-hand correction
//! - [`edge`] and [`impact`]: trajectory/audio fusion for bat and pad contact
//! - [`stumps`] and [`drs`]: stump-zone projection and the final decision
//! - [`pipeline`]: [`analyze_delivery`] wiring the stages together

pub mod calibration;
pub mod classify;
pub mod config;
pub mod drs;
pub mod edge;
pub mod error;
pub mod impact;
pub mod math;
pub mod pipeline;
pub mod shot;
pub mod speed;
pub mod stumps;
pub mod trajectory;

pub use calibration::PitchCalibration;
pub use classify::{classify_spin, classify_swing, BatterHand, CameraOrientation};
pub use config::EngineConfig;
pub use drs::decide;
pub use edge::{fuse_edge, EdgeSignal};
pub use error::{EngineError, EngineResult};
pub use pipeline::{analyze_delivery, DeliveryInput};
pub use shot::{analyze_shot, classify_shot, ShotAnalysis};
pub use speed::estimate_speed;
pub use stumps::project_stumps;
pub use trajectory::{build_trajectory, BuiltTrajectory, TrajectoryOutcome};
