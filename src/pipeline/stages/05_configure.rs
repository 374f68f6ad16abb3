use crate::collaborators::{default_alarms, CollaboratorError};
use crate::error::DeployError;
use crate::kubernetes::{horizontal_pod_autoscaler, ManifestSet};
use crate::pipeline::context::StageContext;
use crate::pipeline::record::{DeploymentStatus, ResourceKind};
use crate::pipeline::stage::DeploymentStage;
use crate::scaling::{ScalingEngine, ScalingOutcome};
use anyhow::Result;
use async_trait::async_trait;

pub struct ConfigureStage;

#[async_trait]
impl DeploymentStage for ConfigureStage {
    fn status(&self) -> DeploymentStatus {
        DeploymentStatus::Configuring
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()> {
        context.checkpoint(80, "Configuring deployment...").await?;

        if context.request.enable_monitoring {
            configure_monitoring(context).await?;
        }

        if context.request.enable_auto_scaling {
            if context.request.enable_kubernetes {
                configure_autoscaler(context).await?;
            } else {
                configure_scaling_policy(context).await?;
            }
        }
        Ok(())
    }
}

pub fn log_group_name(project: &str) -> String {
    format!("/deployhub/{}", project)
}

async fn configure_monitoring(context: &StageContext) -> Result<()> {
    let settings = &context.request.monitoring;
    if !settings.cloudwatch {
        return context
            .log("CloudWatch disabled; no monitoring resources created")
            .await;
    }

    let monitoring = context.collaborators.monitoring.clone();
    let project = context.project_name().to_string();
    let monitoring_error =
        |e: CollaboratorError| DeployError::Deployment(format!("monitoring for {}: {}", project, e));

    let log_group = log_group_name(&project);
    monitoring
        .create_log_group(&log_group, settings.log_retention_days)
        .await
        .map_err(&monitoring_error)?;
    context
        .created(ResourceKind::Monitoring, format!("Log group {}", log_group))
        .await?;

    let stream = monitoring
        .create_metric_stream(&project)
        .await
        .map_err(&monitoring_error)?;
    context
        .created(ResourceKind::Monitoring, format!("Metric stream {}", stream))
        .await?;

    let alarms = monitoring
        .create_alarms(&project, &default_alarms())
        .await
        .map_err(&monitoring_error)?;
    for alarm in alarms {
        context
            .created(ResourceKind::Monitoring, format!("Alarm {}", alarm))
            .await?;
    }
    Ok(())
}

async fn configure_autoscaler(context: &StageContext) -> Result<()> {
    let namespace = context.config.namespace.clone();
    let project = context.project_name().to_string();
    let scaling = &context.request.scaling;
    let hpa = horizontal_pod_autoscaler(
        &project,
        &namespace,
        scaling.min_replicas,
        scaling.max_replicas,
        scaling.target_cpu,
        Some(scaling.target_memory),
    );
    let reference = hpa.reference();
    let manifests = ManifestSet {
        namespace: namespace.clone(),
        manifests: vec![hpa],
    };

    let failure = match context.collaborators.orchestrator.apply(&manifests).await {
        Ok(results) => results
            .into_iter()
            .find(|r| !r.success)
            .map(|r| CollaboratorError::classify(r.error.unwrap_or(r.output))),
        Err(e) => Some(e),
    };

    match failure {
        None => {
            context
                .created(
                    ResourceKind::Scaling,
                    format!("{} ({})", reference, namespace),
                )
                .await
        }
        Some(e) if e.is_permission_denied() => {
            let command = format!(
                "kubectl autoscale deployment {} --min={} --max={} --cpu-percent={} -n {}",
                project, scaling.min_replicas, scaling.max_replicas, scaling.target_cpu, namespace
            );
            context
                .warn(
                    ResourceKind::Scaling,
                    reference,
                    format!("Auto-scaling not configured ({}). Run manually: {}", e, command),
                )
                .await
        }
        Some(e) => Err(DeployError::Scaling(format!("{}: {}", reference, e)).into()),
    }
}

async fn configure_scaling_policy(context: &StageContext) -> Result<()> {
    let engine = ScalingEngine::new(&context.collaborators, context.config.namespace.clone());
    let project = context.project_name().to_string();
    let policy = context.request.scaling.policy();

    match engine.create_policy(&project, &policy).await? {
        ScalingOutcome::Applied { target, .. } => {
            context
                .created(ResourceKind::Scaling, format!("Scaling policy {}", target))
                .await
        }
        ScalingOutcome::Degraded {
            missing_permissions,
            manual_commands,
            ..
        } => {
            context
                .warn(
                    ResourceKind::Scaling,
                    format!("Scaling policy {}", project),
                    format!(
                        "Auto-scaling not configured (missing: {}). Run manually: {}",
                        missing_permissions.join(", "),
                        manual_commands.join(" && ")
                    ),
                )
                .await
        }
    }
}
