//! External collaborators
//!
//! The pipeline only knows these narrow traits. Real implementations shell out to
//! `kubectl`, `aws` and `terraform` or talk to the Docker daemon through bollard;
//! [`mock::MockCloud`] implements every trait in memory for tests and dry runs.

pub mod aws;
pub mod build;
pub mod command;
pub mod docker;
pub mod hosting;
pub mod infrastructure;
pub mod kubectl;
pub mod mock;
pub mod monitoring;
pub mod orchestrator;
pub mod runtime;
pub mod scaling;

use crate::config::DeployhubConfig;
use std::sync::Arc;
use thiserror::Error;

pub use build::{BuildOutcome, BuildRunner, ShellBuildRunner};
pub use hosting::{cache_control_for, content_type_for, CloudHostingClient, Distribution};
pub use infrastructure::{InfrastructureClient, TerraformClient};
pub use monitoring::{default_alarms, AlarmSpec, MonitoringClient};
pub use orchestrator::{ApplyResult, OrchestratorClient, RolloutStatus, WorkloadStatus};
pub use runtime::{ContainerRuntime, ImageBuild, ImageSummary};
pub use scaling::{MetricsSource, ScalingBackend};

/// Substrings that mark an authorization failure in tool or API output
const PERMISSION_MARKERS: &[&str] = &[
    "accessdenied",
    "access denied",
    "unauthorized",
    "forbidden",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Failed(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

impl CollaboratorError {
    /// Maps a raw failure message to `PermissionDenied` or `Failed`
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
            CollaboratorError::PermissionDenied(message)
        } else {
            CollaboratorError::Failed(message)
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CollaboratorError::PermissionDenied(_))
    }
}

/// Every collaborator the pipeline talks to
#[derive(Clone)]
pub struct Collaborators {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub builder: Arc<dyn BuildRunner>,
    pub orchestrator: Arc<dyn OrchestratorClient>,
    pub hosting: Arc<dyn CloudHostingClient>,
    pub monitoring: Arc<dyn MonitoringClient>,
    pub metrics: Arc<dyn MetricsSource>,
    pub scaling: Arc<dyn ScalingBackend>,
    pub infrastructure: Arc<dyn InfrastructureClient>,
}

impl Collaborators {
    /// Real implementations: Docker daemon, kubectl, aws CLI, terraform
    pub fn system(config: &DeployhubConfig) -> Result<Self, CollaboratorError> {
        let aws = Arc::new(aws::AwsCliClient::new(config.region.clone()));
        Ok(Self {
            runtime: Arc::new(docker::DockerRuntime::connect()?),
            builder: Arc::new(ShellBuildRunner::new(config.build_timeout())),
            orchestrator: Arc::new(kubectl::KubectlClient::new()),
            hosting: aws.clone(),
            monitoring: aws.clone(),
            metrics: aws.clone(),
            scaling: aws,
            infrastructure: Arc::new(TerraformClient::new(config.infrastructure_dir.clone())),
        })
    }

    /// Every collaborator backed by one shared in-memory mock
    pub fn mock(mock: Arc<mock::MockCloud>) -> Self {
        Self {
            runtime: mock.clone(),
            builder: mock.clone(),
            orchestrator: mock.clone(),
            hosting: mock.clone(),
            monitoring: mock.clone(),
            metrics: mock.clone(),
            scaling: mock.clone(),
            infrastructure: mock,
        }
    }
}
