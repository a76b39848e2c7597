//! Shared data models for the Crease delivery analysis pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Ball positions and their ingestion formats
//! - Trajectories and event markers
//! - Physical estimates (speed, swing, spin) with provenance
//! - Impact, edge and DRS verdicts
//! - The per-delivery analysis result and boundary codes
//! - Subscription plans and gated features

pub mod analysis;
pub mod estimate;
pub mod plan;
pub mod position;
pub mod trajectory;
pub mod verdict;

// Re-export common types
pub use analysis::{AnalysisStatus, AudioSpike, BoundaryCode, DeliveryAnalysis};
pub use estimate::{
    Provenance, SpeedEstimate, SpeedOutcome, SpeedUnavailable, SpinEstimate, SpinType,
    SwingEstimate, SwingType,
};
pub use plan::{Feature, Plan, PlanLimits, UserId};
pub use position::{
    is_frame_ordered, normalize_positions, FrameSize, NormalizedPoint, Position, RawPosition,
};
pub use trajectory::{EventMarkers, InsufficientReason, Trajectory};
pub use verdict::{
    Decision, DrsDecision, EdgeResult, EdgeRule, EdgeVerdict, ImpactType, ImpactVerdict,
    ShotOutcome, ShotTiming, StumpProjection, WagonZone,
};
