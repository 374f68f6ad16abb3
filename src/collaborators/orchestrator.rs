use super::CollaboratorError;
use crate::kubernetes::ManifestSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-manifest result of an apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// `kind/name`
    pub manifest: String,
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutStatus {
    pub ready: bool,
    /// `ready`, `timeout` or the orchestrator's own message
    pub status: String,
}

impl RolloutStatus {
    pub fn ready() -> Self {
        Self {
            ready: true,
            status: "ready".to_string(),
        }
    }

    pub fn timed_out() -> Self {
        Self {
            ready: false,
            status: "timeout".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadStatus {
    pub name: String,
    pub namespace: String,
    pub replicas: u32,
    pub ready_replicas: u32,
    pub available_replicas: u32,
}

/// Container orchestrator (a Kubernetes cluster)
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    async fn apply(&self, manifests: &ManifestSet) -> Result<Vec<ApplyResult>, CollaboratorError>;

    async fn scale(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: u32,
    ) -> Result<String, CollaboratorError>;

    /// Waits for the deployment rollout; elapsing `timeout` is not an error
    async fn wait_ready(
        &self,
        namespace: &str,
        deployment: &str,
        timeout: Duration,
    ) -> Result<RolloutStatus, CollaboratorError>;

    async fn get(&self, namespace: &str, deployment: &str)
        -> Result<WorkloadStatus, CollaboratorError>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CollaboratorError>;
}
