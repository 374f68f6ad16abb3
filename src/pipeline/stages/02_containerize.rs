use crate::containerization::build_artifacts;
use crate::error::DeployError;
use crate::pipeline::context::StageContext;
use crate::pipeline::record::{DeploymentStatus, ResourceKind};
use crate::pipeline::request::DeploymentRequest;
use crate::pipeline::stage::DeploymentStage;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct ContainerizeStage;

#[async_trait]
impl DeploymentStage for ContainerizeStage {
    fn status(&self) -> DeploymentStatus {
        DeploymentStatus::Containerizing
    }

    fn enabled(&self, request: &DeploymentRequest) -> bool {
        request.enable_containerization
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()> {
        context
            .checkpoint(25, "Generating container artifacts...")
            .await?;

        let artifacts = build_artifacts(context.profile()?).map_err(DeployError::from)?;

        if context.config.write_artifacts {
            let written = artifacts
                .write_to(&context.project_dir)
                .await
                .map_err(DeployError::from)?;
            debug!(files = written.len(), dir = %context.project_dir.display(), "Artifacts written");
        }

        for (name, _) in artifacts.files() {
            context.created(ResourceKind::Artifact, name).await?;
        }

        context
            .checkpoint(
                30,
                format!("Generated {} ({})", artifacts.image_name, artifacts.strategy),
            )
            .await?;
        context.artifacts = Some(artifacts);
        Ok(())
    }
}
