use crate::collaborators::{cache_control_for, content_type_for, CollaboratorError};
use crate::detection::ProjectType;
use crate::error::DeployError;
use crate::kubernetes::{workload_manifests, WorkloadSpec};
use crate::pipeline::context::StageContext;
use crate::pipeline::record::{DeploymentStatus, Resource, ResourceKind};
use crate::pipeline::stage::DeploymentStage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directories never uploaded when the project root itself is the site
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

pub struct DeployStage;

#[async_trait]
impl DeploymentStage for DeployStage {
    fn status(&self) -> DeploymentStatus {
        DeploymentStatus::Deploying
    }

    async fn execute(&self, context: &mut StageContext) -> Result<()> {
        context.checkpoint(60, "Deploying application...").await?;

        if context.request.enable_kubernetes {
            deploy_workload(context).await?;
        }

        deploy_hosting(context).await?;

        context.checkpoint(70, "Application deployed").await?;
        Ok(())
    }
}

/// Storage bucket name: lowercase, `-` separated, unique per deployment
pub fn bucket_name(project: &str, environment: &str, short_id: &str) -> String {
    format!("{}-{}-{}", project, environment, short_id)
        .to_lowercase()
        .replace('_', "-")
}

fn workload_spec(context: &StageContext) -> Result<WorkloadSpec> {
    let profile = context.profile()?;
    let request = &context.request;
    let image = context
        .image
        .clone()
        .or_else(|| context.artifacts.as_ref().map(|a| a.image_name.clone()))
        .unwrap_or_else(|| format!("{}:latest", request.project_name));

    Ok(WorkloadSpec {
        name: request.project_name.clone(),
        image,
        port: profile.port,
        replicas: request.scaling.min_replicas,
        env: profile.environment_vars.clone(),
        resources: request.resources.as_ref().map(|r| r.container_resources()),
        host: request.domain.clone(),
        tls_secret: request.ssl_certificate.clone(),
    })
}

async fn deploy_workload(context: &StageContext) -> Result<()> {
    let namespace = context.config.namespace.clone();
    let spec = workload_spec(context)?;
    let manifests = workload_manifests(&spec, &namespace);

    let results = context
        .collaborators
        .orchestrator
        .apply(&manifests)
        .await
        .map_err(|e| DeployError::Deployment(format!("kubectl apply failed: {}", e)))?;

    let mut failures = Vec::new();
    for result in results {
        if result.success {
            context
                .created(
                    ResourceKind::Kubernetes,
                    format!("{} ({})", result.manifest, namespace),
                )
                .await?;
        } else {
            failures.push(format!(
                "{}: {}",
                result.manifest,
                result.error.unwrap_or(result.output)
            ));
        }
    }
    if !failures.is_empty() {
        return Err(DeployError::Deployment(format!(
            "failed to apply manifests: {}",
            failures.join("; ")
        ))
        .into());
    }

    context
        .log(format!("Waiting for rollout of deployment/{}...", spec.name))
        .await?;
    let rollout = context
        .collaborators
        .orchestrator
        .wait_ready(&namespace, &spec.name, context.config.rollout_timeout())
        .await
        .map_err(|e| DeployError::Deployment(format!("rollout status failed: {}", e)))?;

    if rollout.ready {
        context
            .log(format!("Deployment {} is ready", spec.name))
            .await?;
    } else {
        context
            .warn(
                ResourceKind::Kubernetes,
                format!("deployment/{} ({})", spec.name, namespace),
                format!(
                    "Rollout of {} not ready ({}); continuing",
                    spec.name, rollout.status
                ),
            )
            .await?;
    }
    Ok(())
}

/// Directory whose files are published, if any
fn site_root(context: &StageContext) -> Result<Option<PathBuf>> {
    let profile = context.profile()?;
    let root = match &profile.output_dir {
        Some(dir) => context.project_dir.join(dir),
        None if matches!(profile.project_type, ProjectType::Static | ProjectType::Unknown) => {
            context.project_dir.clone()
        }
        None => return Ok(None),
    };
    Ok(root.is_dir().then_some(root))
}

fn collect_site_files(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        })
    {
        let entry = entry.context("Failed to read site directory entry")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let key = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.push((key, entry.into_path()));
    }
    Ok(files)
}

async fn deploy_hosting(context: &StageContext) -> Result<()> {
    let hosting = context.collaborators.hosting.clone();
    let region = context.request.region.clone();
    let bucket = bucket_name(
        context.project_name(),
        context.request.environment.as_str(),
        &context.short_id,
    );
    let hosting_error =
        |e: CollaboratorError| DeployError::Deployment(format!("bucket {}: {}", bucket, e));

    hosting
        .create_bucket(&bucket, &region)
        .await
        .map_err(&hosting_error)?;
    hosting
        .configure_website(&bucket)
        .await
        .map_err(&hosting_error)?;
    hosting
        .set_public_read_policy(&bucket)
        .await
        .map_err(&hosting_error)?;
    let storage = Resource::new(ResourceKind::Storage, format!("s3://{}", bucket));
    let stored_bucket = bucket.clone();
    context
        .update(move |r| {
            r.bucket = Some(stored_bucket);
            r.created(storage);
        })
        .await?;

    match site_root(context)? {
        Some(root) => {
            let files = tokio::task::spawn_blocking(move || collect_site_files(&root))
                .await
                .context("Site file scan aborted")??;
            for (key, path) in &files {
                let body = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                hosting
                    .upload(&bucket, key, body, content_type_for(key), cache_control_for(key))
                    .await
                    .map_err(&hosting_error)?;
                debug!(bucket = %bucket, key = %key, "Uploaded");
            }
            context
                .log(format!("Uploaded {} files to s3://{}", files.len(), bucket))
                .await?;
        }
        None => {
            context
                .log("No build output found; bucket left empty")
                .await?;
        }
    }

    let distribution = hosting
        .create_distribution(&bucket, &region)
        .await
        .map_err(|e| DeployError::Deployment(format!("CDN distribution for {}: {}", bucket, e)))?;
    info!(
        deployment_id = %context.deployment_id,
        distribution = %distribution.id,
        domain = %distribution.domain_name,
        "CDN distribution created"
    );
    let cdn = Resource::new(
        ResourceKind::Cdn,
        format!("CloudFront {} ({})", distribution.id, distribution.domain_name),
    );
    context
        .update(move |r| {
            r.distribution_id = Some(distribution.id);
            r.created(cdn);
        })
        .await?;
    Ok(())
}
