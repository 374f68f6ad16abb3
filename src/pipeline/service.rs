//! Deployment service: submission, supervision, queries, rollback and cleanup

use super::context::StageContext;
use super::executor::PipelineExecutor;
use super::record::{
    DeploymentFilter, DeploymentRecord, RollbackRecord, RollbackRequest, RollbackStatus,
};
use super::request::DeploymentRequest;
use crate::collaborators::{CollaboratorError, Collaborators};
use crate::config::DeployhubConfig;
use crate::containerization::{build_artifacts, ContainerArtifacts};
use crate::detection::{ProjectAnalyzer, ProjectProfile};
use crate::error::{DeployError, DeployResult};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use crate::scaling::{
    ScalingDecision, ScalingEngine, ScalingOutcome, ScalingPolicy, ScalingTargetKind,
};
use crate::store::{DeploymentStore, InMemoryDeploymentStore};
use regex::Regex;
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// `not authorized to perform: s3:CreateBucket` style fragments in cloud errors
fn denied_action_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"perform:\s*([A-Za-z0-9-]+:[A-Za-z0-9*]+)").ok())
        .as_ref()
}

/// Result of an infrastructure-as-code run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InfrastructureOutcome {
    Applied {
        output: String,
    },
    /// Credentials lacked permissions; the operator can run the command by hand
    Degraded {
        missing_permissions: Vec<String>,
        manual_command: String,
        error: String,
    },
}

impl InfrastructureOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, InfrastructureOutcome::Degraded { .. })
    }
}

fn denied_actions(message: &str) -> Vec<String> {
    let Some(pattern) = denied_action_pattern() else {
        return Vec::new();
    };
    let mut actions: Vec<String> = pattern
        .captures_iter(message)
        .map(|c| c[1].to_string())
        .collect();
    actions.dedup();
    actions
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Entry point for every deployment operation
///
/// Each submission runs as its own tokio task, watched by a supervisor task that
/// turns a panic into a `failed` record.
pub struct DeploymentPipeline {
    config: Arc<DeployhubConfig>,
    collaborators: Collaborators,
    store: Arc<dyn DeploymentStore>,
    progress: Arc<dyn ProgressHandler>,
    running: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
    rollbacks: Arc<RwLock<HashMap<Uuid, RollbackRecord>>>,
    scaling: ScalingEngine,
}

impl DeploymentPipeline {
    pub fn new(config: DeployhubConfig, collaborators: Collaborators) -> Self {
        Self::with_store(config, collaborators, Arc::new(InMemoryDeploymentStore::new()))
    }

    pub fn with_store(
        config: DeployhubConfig,
        collaborators: Collaborators,
        store: Arc<dyn DeploymentStore>,
    ) -> Self {
        let scaling = ScalingEngine::new(&collaborators, config.namespace.clone());
        Self {
            config: Arc::new(config),
            collaborators,
            store,
            progress: Arc::new(LoggingHandler),
            running: Arc::new(Mutex::new(HashMap::new())),
            tasks: Mutex::new(HashMap::new()),
            rollbacks: Arc::new(RwLock::new(HashMap::new())),
            scaling,
        }
    }

    pub fn with_progress_handler(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub fn config(&self) -> &DeployhubConfig {
        &self.config
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn running(&self) -> MutexGuard<'_, HashMap<Uuid, CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn analyze(&self, path: &Path) -> DeployResult<ProjectProfile> {
        Ok(ProjectAnalyzer::new(path).analyze().await?)
    }

    pub fn plan(&self, profile: &ProjectProfile) -> DeployResult<ContainerArtifacts> {
        Ok(build_artifacts(profile)?)
    }

    /// Validates and records the request, then starts it in the background
    ///
    /// The project is read from `<projects_dir>/<project_name>`.
    pub async fn submit(&self, request: DeploymentRequest) -> DeployResult<Uuid> {
        let project_dir = self.config.project_dir(&request.project_name);
        self.submit_at(request, project_dir).await
    }

    /// Like [`submit`](Self::submit) with an explicit project directory
    pub async fn submit_at(
        &self,
        request: DeploymentRequest,
        project_dir: PathBuf,
    ) -> DeployResult<Uuid> {
        request.validate()?;

        let record = DeploymentRecord::new(request);
        let id = record.id;
        let mut context = StageContext::new(
            &record,
            project_dir,
            self.config.clone(),
            self.collaborators.clone(),
            self.store.clone(),
        );
        self.store.put(record).await?;
        info!(deployment_id = %id, project = %context.project_name(), "Deployment submitted");

        let cancel = CancellationToken::new();
        self.running().insert(id, cancel.clone());

        let executor = PipelineExecutor::new(self.progress.clone());
        let worker = tokio::spawn(async move { executor.execute(&mut context, &cancel).await });

        let store = self.store.clone();
        let running = self.running.clone();
        let progress = self.progress.clone();
        let supervisor = tokio::spawn(async move {
            let outcome = worker.await;
            running
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);

            let Err(join_error) = outcome else {
                return;
            };
            let message = if join_error.is_panic() {
                format!("execution panicked: {}", panic_message(join_error.into_panic()))
            } else {
                "execution aborted".to_string()
            };
            error!(deployment_id = %id, error = %message, "Deployment task died");
            progress.on_progress(&ProgressEvent::Failed {
                deployment_id: id,
                error: message.clone(),
            });
            if let Err(e) = store.update(id, Box::new(move |r| r.fail(message))).await {
                warn!(deployment_id = %id, error = %e, "Could not record task failure");
            }
        });

        let mut tasks = self.tasks();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(id, supervisor);
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> DeployResult<DeploymentRecord> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list(&self, filter: &DeploymentFilter) -> DeployResult<Vec<DeploymentRecord>> {
        Ok(self.store.list(filter).await?)
    }

    /// Waits for the background execution of `id` and returns the final record
    pub async fn wait(&self, id: Uuid) -> DeployResult<DeploymentRecord> {
        let handle = self.tasks().remove(&id);
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(deployment_id = %id, error = %e, "Supervisor task failed");
            }
        }
        self.get(id).await
    }

    /// Requests cooperative cancellation; false when `id` is not running
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.running().get(&id) {
            Some(token) => {
                token.cancel();
                info!(deployment_id = %id, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.running().contains_key(&id)
    }

    /// Starts a rollback tracked by its own record; the deployment itself is left as is
    pub async fn rollback(
        &self,
        deployment_id: Uuid,
        request: RollbackRequest,
    ) -> DeployResult<Uuid> {
        self.store.get(deployment_id).await?;

        let record = RollbackRecord::new(deployment_id, request);
        let id = record.id;
        self.rollbacks.write().await.insert(id, record);
        info!(rollback_id = %id, deployment_id = %deployment_id, "Rollback requested");

        let rollbacks = self.rollbacks.clone();
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            let deployment = store.get(deployment_id).await;

            let mut rollbacks = rollbacks.write().await;
            let Some(rollback) = rollbacks.get_mut(&id) else {
                return;
            };
            rollback.set_status(RollbackStatus::Running);
            rollback.log(format!(
                "Rolling back deployment {} to {}",
                deployment_id,
                rollback.target_version.as_deref().unwrap_or("the previous version")
            ));

            let blocked = match &deployment {
                Err(e) => Some(format!("Deployment unavailable: {}", e)),
                Ok(d) if !d.status.is_terminal() && !rollback.options.force => Some(format!(
                    "Deployment is still {}; retry with force to roll back anyway",
                    d.status
                )),
                Ok(_) => None,
            };

            match blocked {
                Some(reason) => {
                    warn!(rollback_id = %id, reason = %reason, "Rollback failed");
                    rollback.log(format!("Rollback failed: {}", reason));
                    rollback.set_status(RollbackStatus::Failed);
                }
                None => {
                    if rollback.options.preserve_data {
                        rollback.log("Data volumes preserved");
                    }
                    rollback.log("Rollback completed");
                    rollback.set_status(RollbackStatus::Completed);
                    info!(rollback_id = %id, "Rollback completed");
                }
            }
        });
        self.tasks().insert(id, handle);
        Ok(id)
    }

    pub async fn get_rollback(&self, id: Uuid) -> DeployResult<RollbackRecord> {
        self.rollbacks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| DeployError::not_found(id.to_string()))
    }

    pub async fn wait_rollback(&self, id: Uuid) -> DeployResult<RollbackRecord> {
        let handle = self.tasks().remove(&id);
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(rollback_id = %id, error = %e, "Rollback task failed");
            }
        }
        self.get_rollback(id).await
    }

    /// Removes the deployment after best-effort cleanup of what it created
    pub async fn delete(&self, id: Uuid) -> DeployResult<()> {
        let record = self.store.get(id).await?;
        self.cancel(id);
        self.cleanup(&record).await;
        self.store.delete(id).await?;
        self.prune_rollbacks(id).await;
        info!(deployment_id = %id, project = %record.project_name, "Deployment deleted");
        Ok(())
    }

    /// Drops the rollback records of a deleted deployment along with their tasks
    async fn prune_rollbacks(&self, deployment_id: Uuid) {
        let pruned: Vec<Uuid> = {
            let mut rollbacks = self.rollbacks.write().await;
            let ids = rollbacks
                .values()
                .filter(|r| r.deployment_id == deployment_id)
                .map(|r| r.id)
                .collect::<Vec<_>>();
            for rollback_id in &ids {
                rollbacks.remove(rollback_id);
            }
            ids
        };
        if pruned.is_empty() {
            return;
        }
        let mut tasks = self.tasks();
        for rollback_id in &pruned {
            if let Some(handle) = tasks.remove(rollback_id) {
                handle.abort();
            }
        }
        debug!(deployment_id = %deployment_id, rollbacks = pruned.len(), "Pruned rollback records");
    }

    async fn cleanup(&self, record: &DeploymentRecord) {
        let c = &self.collaborators;
        let project = record.project_name.as_str();
        let mut failures: Vec<(String, CollaboratorError)> = Vec::new();

        if record.options.enable_kubernetes {
            if let Err(e) = c.orchestrator.delete(&self.config.namespace, project).await {
                failures.push((format!("workload {}", project), e));
            }
        }
        if let Some(distribution) = &record.distribution_id {
            if let Err(e) = c.hosting.delete_distribution(distribution).await {
                failures.push((format!("distribution {}", distribution), e));
            }
        }
        if let Some(bucket) = &record.bucket {
            if let Err(e) = c.hosting.delete_bucket(bucket).await {
                failures.push((format!("bucket {}", bucket), e));
            }
        }
        if record.image.is_some() {
            let container = format!("{}-{}", project, record.short_id());
            if let Err(e) = c.runtime.stop(&container).await {
                failures.push((format!("container {}", container), e));
            }
        }
        if record.options.enable_monitoring {
            if let Err(e) = c.monitoring.delete(project).await {
                failures.push((format!("monitoring for {}", project), e));
            }
        }

        for (resource, e) in failures {
            warn!(deployment_id = %record.id, resource = %resource, error = %e, "Cleanup failed");
        }
    }

    fn supported(kind: &ScalingTargetKind) -> DeployResult<()> {
        match kind {
            ScalingTargetKind::Custom(other) => Err(DeployError::Scaling(format!(
                "unsupported scaling target kind '{}'",
                other
            ))),
            _ => Ok(()),
        }
    }

    pub async fn decide_scaling(
        &self,
        resource_id: &str,
        kind: &ScalingTargetKind,
    ) -> DeployResult<ScalingDecision> {
        Self::supported(kind)?;
        Ok(self.scaling.decide_for(resource_id, kind).await)
    }

    pub async fn apply_scaling(
        &self,
        kind: &ScalingTargetKind,
        target: &str,
        decision: &ScalingDecision,
    ) -> DeployResult<ScalingOutcome> {
        self.scaling.apply(kind, target, decision).await
    }

    pub async fn create_scaling_policy(
        &self,
        service_id: &str,
        policy: &ScalingPolicy,
    ) -> DeployResult<ScalingOutcome> {
        self.scaling.create_policy(service_id, policy).await
    }

    pub async fn provision_infrastructure(&self) -> DeployResult<InfrastructureOutcome> {
        let result = self.collaborators.infrastructure.deploy().await;
        self.infrastructure_outcome("apply", result)
    }

    pub async fn destroy_infrastructure(&self) -> DeployResult<InfrastructureOutcome> {
        let result = self.collaborators.infrastructure.destroy().await;
        self.infrastructure_outcome("destroy", result)
    }

    fn infrastructure_outcome(
        &self,
        action: &str,
        result: Result<String, CollaboratorError>,
    ) -> DeployResult<InfrastructureOutcome> {
        match result {
            Ok(output) => {
                info!(action, "Infrastructure {} complete", action);
                Ok(InfrastructureOutcome::Applied { output })
            }
            Err(CollaboratorError::PermissionDenied(message)) => {
                warn!(action, error = %message, "Infrastructure change not permitted");
                Ok(InfrastructureOutcome::Degraded {
                    missing_permissions: denied_actions(&message),
                    manual_command: format!(
                        "terraform -chdir={} {} -auto-approve",
                        self.config.infrastructure_dir.display(),
                        action
                    ),
                    error: message,
                })
            }
            Err(e) => Err(DeployError::Deployment(format!(
                "infrastructure {} failed: {}",
                action, e
            ))),
        }
    }
}
