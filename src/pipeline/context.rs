use super::record::{DeploymentRecord, DeploymentStatus, Resource, ResourceKind};
use super::request::DeploymentRequest;
use crate::collaborators::Collaborators;
use crate::config::DeployhubConfig;
use crate::containerization::ContainerArtifacts;
use crate::detection::ProjectProfile;
use crate::store::DeploymentStore;
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// State shared by the stages of one deployment
///
/// Every record mutation goes through the store so readers polling the
/// deployment see each checkpoint as soon as it happens.
pub struct StageContext {
    pub deployment_id: Uuid,
    pub request: DeploymentRequest,
    pub project_dir: PathBuf,
    pub config: Arc<DeployhubConfig>,
    pub collaborators: Collaborators,
    store: Arc<dyn DeploymentStore>,
    pub profile: Option<ProjectProfile>,
    pub artifacts: Option<ContainerArtifacts>,
    pub image: Option<String>,
    pub short_id: String,
}

impl StageContext {
    pub fn new(
        record: &DeploymentRecord,
        project_dir: PathBuf,
        config: Arc<DeployhubConfig>,
        collaborators: Collaborators,
        store: Arc<dyn DeploymentStore>,
    ) -> Self {
        Self {
            deployment_id: record.id,
            request: record.options.clone(),
            project_dir,
            config,
            collaborators,
            store,
            profile: None,
            artifacts: None,
            image: None,
            short_id: record.short_id(),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.request.project_name
    }

    pub fn profile(&self) -> Result<&ProjectProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| anyhow!("project profile missing; detection has not run"))
    }

    pub async fn update<F>(&self, mutate: F) -> Result<DeploymentRecord>
    where
        F: FnOnce(&mut DeploymentRecord) + Send + 'static,
    {
        self.store
            .update(self.deployment_id, Box::new(mutate))
            .await
            .with_context(|| format!("failed to update deployment {}", self.deployment_id))
    }

    pub async fn transition(&self, status: DeploymentStatus) -> Result<()> {
        let record = self
            .update(move |r| {
                r.transition(status);
            })
            .await?;
        if record.status != status {
            bail!(
                "deployment {} cannot move to {} from {}",
                self.deployment_id,
                status,
                record.status
            );
        }
        Ok(())
    }

    pub async fn log(&self, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update(move |r| r.log(message)).await.map(|_| ())
    }

    /// Raises progress and appends a log line in one update
    pub async fn checkpoint(&self, progress: u8, message: impl Into<String>) -> Result<()> {
        let message = message.into();
        self.update(move |r| {
            r.advance(progress);
            r.log(message);
        })
        .await
        .map(|_| ())
    }

    pub async fn created(&self, kind: ResourceKind, name: impl Into<String>) -> Result<()> {
        let resource = Resource::new(kind, name);
        self.update(move |r| r.created(resource)).await.map(|_| ())
    }

    /// Non-fatal problem: logged as a warning and tracked as a failed resource
    pub async fn warn(
        &self,
        kind: ResourceKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<()> {
        let resource = Resource::new(kind, name);
        let message = message.into();
        warn!(deployment_id = %self.deployment_id, resource = %resource, "{}", message);
        self.update(move |r| {
            r.log(format!("Warning: {}", message));
            r.failed_resource(resource);
        })
        .await
        .map(|_| ())
    }
}
