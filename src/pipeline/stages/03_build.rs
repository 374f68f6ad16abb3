use crate::error::DeployError;
use crate::pipeline::context::StageContext;
use crate::pipeline::record::{DeploymentStatus, ResourceKind};
use crate::pipeline::stage::DeploymentStage;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

pub struct BuildStage;

#[async_trait]
impl DeploymentStage for BuildStage {
    fn status(&self) -> DeploymentStatus {
        DeploymentStatus::Building
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()> {
        context.checkpoint(40, "Building project...").await?;

        match context.profile()?.build_command.clone() {
            Some(command) => {
                context
                    .checkpoint(45, format!("Running: {}", command))
                    .await?;
                let outcome = context
                    .collaborators
                    .builder
                    .run(&command, &context.project_dir)
                    .await
                    .map_err(|e| DeployError::Build(format!("`{}`: {}", command, e)))?;
                info!(
                    deployment_id = %context.deployment_id,
                    duration_ms = outcome.duration_ms,
                    "Build command finished"
                );
            }
            None => {
                context
                    .checkpoint(45, "No build command required")
                    .await?;
            }
        }

        if let Some(artifacts) = &context.artifacts {
            if context.config.write_artifacts {
                let tag = format!("{}:{}", context.project_name(), context.short_id).to_lowercase();
                let build = context
                    .collaborators
                    .runtime
                    .build(&context.project_dir, &tag)
                    .await
                    .map_err(|e| DeployError::Build(format!("image {}: {}", tag, e)))?;
                debug!(image = %build.image, strategy = %artifacts.strategy, "Image built");

                context
                    .created(ResourceKind::ContainerImage, format!("Container image {}", build.image))
                    .await?;
                let image = build.image.clone();
                context.update(move |r| r.image = Some(image)).await?;
                context.image = Some(build.image);
            } else {
                context
                    .log("Container artifacts were not written; skipping image build")
                    .await?;
            }
        }

        context
            .created(ResourceKind::Build, "Build artifacts")
            .await?;
        Ok(())
    }
}
