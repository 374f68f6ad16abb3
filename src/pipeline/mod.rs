//! Staged deployment pipeline
//!
//! A [`DeploymentRequest`] becomes a [`DeploymentRecord`] that moves forward through
//! `pending → detecting → containerizing → building → deploying → configuring →
//! success`, or drops to `failed` from any stage.

pub mod context;
pub mod executor;
pub mod record;
pub mod request;
pub mod service;
pub mod stage;
pub mod stages;

pub use context::StageContext;
pub use executor::PipelineExecutor;
pub use record::{
    DeploymentFilter, DeploymentRecord, DeploymentStatus, LogEntry, Resource, ResourceKind,
    RollbackRecord, RollbackRequest, RollbackStatus,
};
pub use request::{
    DeploymentRequest, DeploymentStrategy, Environment, MonitoringSettings, ResourceSettings,
    ScalingSettings,
};
pub use service::{DeploymentPipeline, InfrastructureOutcome};
pub use stage::DeploymentStage;
