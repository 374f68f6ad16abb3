//! Metrics-driven scaling decisions
//!
//! [`decide`] is a pure threshold rule. [`ScalingEngine`] wires it to a metrics
//! source and applies decisions per target kind, turning permission gaps into
//! [`ScalingOutcome::Degraded`] results instead of errors.

pub mod engine;
pub mod types;

pub use engine::{decide, degraded_decision, function_concurrency, ScalingEngine, METRICS_WINDOW};
pub use types::{
    MetricsSnapshot, ScalingDecision, ScalingDirection, ScalingOutcome, ScalingPolicy,
    ScalingTargetKind,
};
