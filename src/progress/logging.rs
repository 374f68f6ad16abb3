//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                deployment_id,
                project_name,
            } => {
                info!(deployment_id = %deployment_id, project = %project_name, "Starting deployment");
            }
            ProgressEvent::StageStarted {
                deployment_id,
                stage,
            } => {
                info!(deployment_id = %deployment_id, stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete {
                deployment_id,
                stage,
                duration,
            } => {
                info!(
                    deployment_id = %deployment_id,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::StageSkipped {
                deployment_id,
                stage,
            } => {
                debug!(deployment_id = %deployment_id, stage = %stage, "Stage disabled");
            }
            ProgressEvent::Completed {
                deployment_id,
                total_time,
            } => {
                info!(
                    deployment_id = %deployment_id,
                    total_time_ms = total_time.as_millis(),
                    "Deployment complete"
                );
            }
            ProgressEvent::Failed {
                deployment_id,
                error,
            } => {
                warn!(deployment_id = %deployment_id, error = %error, "Deployment failed");
            }
        }
    }
}
