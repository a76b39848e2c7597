//! Delivery analysis worker.
//!
//! Wires the media front-end and the analysis engine together:
//! - [`analyzer`]: clip to [`DeliveryReport`], CPU work on the blocking pool
//! - [`executor`]: bounded concurrency and per-delivery timeouts
//! - [`session`]: identity, entitlement and coaching collaborators
//! - [`config`], [`logging`], [`metrics`]: ambient plumbing

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod session;

pub use analyzer::{AnalysisOptions, DeliveryAnalyzer, DeliveryReport, PositionsFile};
pub use config::{load_engine_config, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{DeliveryExecutor, DeliveryJob};
pub use logging::DeliveryLogger;
pub use session::{CoachingAnswer, ReviewSession};
