use crate::detection::ProjectAnalyzer;
use crate::error::DeployError;
use crate::pipeline::context::StageContext;
use crate::pipeline::record::DeploymentStatus;
use crate::pipeline::stage::DeploymentStage;
use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

pub struct DetectStage;

#[async_trait]
impl DeploymentStage for DetectStage {
    fn status(&self) -> DeploymentStatus {
        DeploymentStatus::Detecting
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()> {
        context
            .checkpoint(10, "Analyzing project structure...")
            .await?;

        let profile = ProjectAnalyzer::new(&context.project_dir)
            .analyze()
            .await
            .map_err(DeployError::from)?;

        let message = format!(
            "Detected {} project (confidence: {:.2})",
            profile.project_type, profile.confidence_score
        );
        let stored = profile.clone();
        context
            .update(move |r| {
                r.profile = Some(stored);
                r.advance(15);
                r.log(message);
            })
            .await?;

        if let Some(hint) = context.request.type_hint() {
            if hint != profile.project_type {
                warn!(
                    deployment_id = %context.deployment_id,
                    requested = %hint,
                    detected = %profile.project_type,
                    "Requested project type differs from detection"
                );
                context
                    .log(format!(
                        "Requested project type {} differs from detected {}",
                        hint, profile.project_type
                    ))
                    .await?;
            }
        }

        context.profile = Some(profile);
        Ok(())
    }
}
