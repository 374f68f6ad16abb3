//! deployhub - project detection, containerization and staged deployments
//!
//! Given an uploaded project tree, deployhub classifies its technology, renders
//! container build artifacts for it and drives a multi-stage deployment across the
//! container runtime, a Kubernetes cluster and cloud hosting, tracking progress, logs
//! and created resources on a [`DeploymentRecord`]. A separate engine turns
//! utilization metrics into scaling decisions.
//!
//! # Example Usage
//!
//! ```no_run
//! use deployhub::collaborators::{mock::MockCloud, Collaborators};
//! use deployhub::{DeployhubConfig, DeploymentPipeline, DeploymentRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), deployhub::DeployError> {
//! let pipeline = DeploymentPipeline::new(
//!     DeployhubConfig::default(),
//!     Collaborators::mock(Arc::new(MockCloud::default())),
//! );
//!
//! let id = pipeline.submit(DeploymentRequest::new("shop")).await?;
//! let record = pipeline.wait(id).await?;
//! println!("{} -> {}", record.project_name, record.status);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`detection`]: heuristic project-type detection
//! - [`containerization`]: build strategy selection and artifact rendering
//! - [`pipeline`]: deployment state machine, stages and the service facade
//! - [`scaling`]: metrics-driven scaling decisions and their application
//! - [`collaborators`]: narrow interfaces to external tools, with real and mock implementations

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod containerization;
pub mod detection;
pub mod error;
pub mod kubernetes;
pub mod pipeline;
pub mod progress;
pub mod scaling;
pub mod store;
pub mod util;

pub use collaborators::{CollaboratorError, Collaborators};
pub use config::{ConfigError, DeployhubConfig};
pub use containerization::{build_artifacts, plan, ContainerArtifacts, DockerfileStrategy};
pub use detection::{AnalysisError, ProjectAnalyzer, ProjectProfile, ProjectType};
pub use error::{DeployError, DeployResult, ValidationError};
pub use pipeline::{
    DeploymentFilter, DeploymentPipeline, DeploymentRecord, DeploymentRequest, DeploymentStatus,
    RollbackRequest,
};
pub use scaling::{ScalingDecision, ScalingEngine, ScalingOutcome, ScalingTargetKind};
pub use store::{DeploymentStore, InMemoryDeploymentStore};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_deployhub() {
        assert_eq!(NAME, "deployhub");
    }
}
