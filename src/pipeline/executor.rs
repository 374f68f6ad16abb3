use super::context::StageContext;
use super::record::DeploymentStatus;
use super::stage::DeploymentStage;
use super::stages::default_stages;
use crate::progress::{ProgressEvent, ProgressHandler};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs the stage sequence for one deployment and records the terminal state
pub struct PipelineExecutor {
    stages: Vec<Box<dyn DeploymentStage>>,
    progress: Arc<dyn ProgressHandler>,
}

impl PipelineExecutor {
    pub fn new(progress: Arc<dyn ProgressHandler>) -> Self {
        Self::with_stages(default_stages(), progress)
    }

    pub fn with_stages(
        stages: Vec<Box<dyn DeploymentStage>>,
        progress: Arc<dyn ProgressHandler>,
    ) -> Self {
        Self { stages, progress }
    }

    /// Never returns an error: failures end up on the record as `failed`
    pub async fn execute(
        &self,
        context: &mut StageContext,
        cancel: &CancellationToken,
    ) -> DeploymentStatus {
        let start = Instant::now();
        let deployment_id = context.deployment_id;
        info!(deployment_id = %deployment_id, project = %context.project_name(), "Starting deployment");
        self.progress.on_progress(&ProgressEvent::Started {
            deployment_id,
            project_name: context.project_name().to_string(),
        });

        match self.run_stages(context, cancel).await {
            Ok(()) => {
                let base_domain = context.config.base_domain.clone();
                let finished = context.update(move |r| r.succeed(&base_domain)).await;
                match finished {
                    Ok(record) if record.status == DeploymentStatus::Success => {
                        info!(
                            deployment_id = %deployment_id,
                            url = record.url.as_deref().unwrap_or_default(),
                            "Deployment succeeded"
                        );
                        self.progress.on_progress(&ProgressEvent::Completed {
                            deployment_id,
                            total_time: start.elapsed(),
                        });
                        DeploymentStatus::Success
                    }
                    Ok(record) => record.status,
                    Err(e) => self.record_failure(context, &e).await,
                }
            }
            Err(e) => self.record_failure(context, &e).await,
        }
    }

    async fn run_stages(&self, context: &mut StageContext, cancel: &CancellationToken) -> Result<()> {
        for stage in &self.stages {
            let status = stage.status();
            if cancel.is_cancelled() {
                bail!("cancelled");
            }

            if !stage.enabled(&context.request) {
                debug!(deployment_id = %context.deployment_id, stage = %status, "Stage disabled");
                self.progress.on_progress(&ProgressEvent::StageSkipped {
                    deployment_id: context.deployment_id,
                    stage: status,
                });
                continue;
            }

            context.transition(status).await?;
            self.progress.on_progress(&ProgressEvent::StageStarted {
                deployment_id: context.deployment_id,
                stage: status,
            });

            let stage_start = Instant::now();
            stage
                .execute(context)
                .await
                .with_context(|| format!("{} stage failed", status))?;

            self.progress.on_progress(&ProgressEvent::StageComplete {
                deployment_id: context.deployment_id,
                stage: status,
                duration: stage_start.elapsed(),
            });
        }

        if cancel.is_cancelled() {
            bail!("cancelled");
        }
        Ok(())
    }

    async fn record_failure(&self, context: &StageContext, error: &anyhow::Error) -> DeploymentStatus {
        let message = format!("{:#}", error);
        self.progress.on_progress(&ProgressEvent::Failed {
            deployment_id: context.deployment_id,
            error: message.clone(),
        });
        // The record may be gone if the deployment was deleted mid-run
        let _ = context.update(move |r| r.fail(message)).await;
        DeploymentStatus::Failed
    }
}
