use super::context::StageContext;
use super::record::DeploymentStatus;
use super::request::DeploymentRequest;
use anyhow::Result;
use async_trait::async_trait;

/// One step of the deployment state machine
#[async_trait]
pub trait DeploymentStage: Send + Sync {
    /// Status the record holds while this stage runs
    fn status(&self) -> DeploymentStatus;

    /// Disabled stages are skipped without touching the record
    fn enabled(&self, _request: &DeploymentRequest) -> bool {
        true
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()>;
}
