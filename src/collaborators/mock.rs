//! In-memory collaborators for tests and dry runs
//!
//! [`MockCloud`] implements every collaborator trait. Each call is recorded under an
//! operation name such as `runtime.build` or `hosting.create_bucket`; failures,
//! panics and latency can be injected per operation.

use super::build::{BuildOutcome, BuildRunner};
use super::hosting::{CloudHostingClient, Distribution};
use super::infrastructure::InfrastructureClient;
use super::monitoring::{AlarmSpec, MonitoringClient};
use super::orchestrator::{ApplyResult, OrchestratorClient, RolloutStatus, WorkloadStatus};
use super::runtime::{ContainerRuntime, ImageBuild, ImageSummary};
use super::scaling::{MetricsSource, ScalingBackend};
use super::CollaboratorError;
use crate::kubernetes::ManifestSet;
use crate::scaling::{MetricsSnapshot, ScalingPolicy, ScalingTargetKind};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One object passed to `hosting.upload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub cache_control: String,
    pub size: usize,
}

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    failures: HashMap<String, CollaboratorError>,
    panics: HashSet<String>,
    delay: Option<Duration>,
    metrics: HashMap<String, MetricsSnapshot>,
    rollout: Option<RolloutStatus>,
    uploads: Vec<UploadedObject>,
    applied: Vec<String>,
    capacity_requests: Vec<(String, u32)>,
    images: Vec<ImageSummary>,
}

#[derive(Default)]
pub struct MockCloud {
    state: Mutex<MockState>,
}

impl MockCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later call to `operation` fail with `error`
    pub fn fail_on(&self, operation: &str, error: CollaboratorError) -> &Self {
        self.state().failures.insert(operation.to_string(), error);
        self
    }

    /// Makes every later call to `operation` panic
    pub fn panic_on(&self, operation: &str) -> &Self {
        self.state().panics.insert(operation.to_string());
        self
    }

    /// Sleeps before answering any call
    pub fn set_delay(&self, delay: Duration) -> &Self {
        self.state().delay = Some(delay);
        self
    }

    pub fn set_metrics(&self, resource_id: &str, snapshot: MetricsSnapshot) -> &Self {
        self.state()
            .metrics
            .insert(resource_id.to_string(), snapshot);
        self
    }

    /// Result returned by `orchestrator.wait_ready`; ready when unset
    pub fn set_rollout(&self, status: RolloutStatus) -> &Self {
        self.state().rollout = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn was_called(&self, operation: &str) -> bool {
        self.state().calls.iter().any(|c| c == operation)
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == operation).count()
    }

    pub fn uploads(&self) -> Vec<UploadedObject> {
        self.state().uploads.clone()
    }

    /// `kind/name` of every manifest applied, in order
    pub fn applied(&self) -> Vec<String> {
        self.state().applied.clone()
    }

    /// `(target, capacity)` for every capacity change requested
    pub fn capacity_requests(&self) -> Vec<(String, u32)> {
        self.state().capacity_requests.clone()
    }

    async fn enter(&self, operation: &str) -> Result<(), CollaboratorError> {
        let (delay, should_panic, failure) = {
            let mut state = self.state();
            state.calls.push(operation.to_string());
            (
                state.delay,
                state.panics.contains(operation),
                state.failures.get(operation).cloned(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if should_panic {
            panic!("injected panic in {}", operation);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerRuntime for MockCloud {
    async fn build(&self, _context: &Path, tag: &str) -> Result<ImageBuild, CollaboratorError> {
        self.enter("runtime.build").await?;
        self.state().images.push(ImageSummary {
            name: tag.to_string(),
            size: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(ImageBuild {
            image: tag.to_string(),
            log: format!("Successfully tagged {}\n", tag),
        })
    }

    async fn run(&self, _image: &str, _port: u16, name: &str) -> Result<String, CollaboratorError> {
        self.enter("runtime.run").await?;
        Ok(format!("mock-{}", name))
    }

    async fn list(&self) -> Result<Vec<ImageSummary>, CollaboratorError> {
        self.enter("runtime.list").await?;
        Ok(self.state().images.clone())
    }

    async fn stop(&self, _name: &str) -> Result<(), CollaboratorError> {
        self.enter("runtime.stop").await
    }
}

#[async_trait]
impl BuildRunner for MockCloud {
    async fn run(&self, command: &str, _workdir: &Path) -> Result<BuildOutcome, CollaboratorError> {
        self.enter("build.run").await?;
        Ok(BuildOutcome {
            output: format!("$ {}\n", command),
            duration_ms: 0,
        })
    }
}

#[async_trait]
impl OrchestratorClient for MockCloud {
    async fn apply(&self, manifests: &ManifestSet) -> Result<Vec<ApplyResult>, CollaboratorError> {
        self.enter("orchestrator.apply").await?;
        let results: Vec<ApplyResult> = manifests
            .manifests
            .iter()
            .map(|m| ApplyResult {
                manifest: m.reference(),
                success: true,
                output: format!("{} created", m.reference()),
                error: None,
            })
            .collect();
        self.state()
            .applied
            .extend(results.iter().map(|r| r.manifest.clone()));
        Ok(results)
    }

    async fn scale(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: u32,
    ) -> Result<String, CollaboratorError> {
        self.enter("orchestrator.scale").await?;
        self.state()
            .capacity_requests
            .push((format!("{}/{}", namespace, deployment), replicas));
        Ok(format!("deployment.apps/{} scaled", deployment))
    }

    async fn wait_ready(
        &self,
        _namespace: &str,
        _deployment: &str,
        _timeout: Duration,
    ) -> Result<RolloutStatus, CollaboratorError> {
        self.enter("orchestrator.wait_ready").await?;
        Ok(self.state().rollout.clone().unwrap_or_else(RolloutStatus::ready))
    }

    async fn get(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<WorkloadStatus, CollaboratorError> {
        self.enter("orchestrator.get").await?;
        Ok(WorkloadStatus {
            name: deployment.to_string(),
            namespace: namespace.to_string(),
            replicas: 1,
            ready_replicas: 1,
            available_replicas: 1,
        })
    }

    async fn delete(&self, _namespace: &str, _name: &str) -> Result<(), CollaboratorError> {
        self.enter("orchestrator.delete").await
    }
}

#[async_trait]
impl CloudHostingClient for MockCloud {
    async fn create_bucket(&self, _bucket: &str, _region: &str) -> Result<(), CollaboratorError> {
        self.enter("hosting.create_bucket").await
    }

    async fn configure_website(&self, _bucket: &str) -> Result<(), CollaboratorError> {
        self.enter("hosting.configure_website").await
    }

    async fn set_public_read_policy(&self, _bucket: &str) -> Result<(), CollaboratorError> {
        self.enter("hosting.set_public_read_policy").await
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), CollaboratorError> {
        self.enter("hosting.upload").await?;
        self.state().uploads.push(UploadedObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            cache_control: cache_control.to_string(),
            size: body.len(),
        });
        Ok(())
    }

    async fn create_distribution(
        &self,
        bucket: &str,
        _region: &str,
    ) -> Result<Distribution, CollaboratorError> {
        self.enter("hosting.create_distribution").await?;
        Ok(Distribution {
            id: format!("E{}", bucket.len()),
            domain_name: format!("{}.cloudfront.net", bucket),
            status: "InProgress".to_string(),
        })
    }

    async fn get_distribution(&self, id: &str) -> Result<Distribution, CollaboratorError> {
        self.enter("hosting.get_distribution").await?;
        Ok(Distribution {
            id: id.to_string(),
            domain_name: format!("{}.cloudfront.net", id.to_lowercase()),
            status: "Deployed".to_string(),
        })
    }

    async fn delete_distribution(&self, _id: &str) -> Result<(), CollaboratorError> {
        self.enter("hosting.delete_distribution").await
    }

    async fn delete_bucket(&self, _bucket: &str) -> Result<(), CollaboratorError> {
        self.enter("hosting.delete_bucket").await
    }
}

#[async_trait]
impl MonitoringClient for MockCloud {
    async fn create_log_group(
        &self,
        _name: &str,
        _retention_days: u32,
    ) -> Result<(), CollaboratorError> {
        self.enter("monitoring.create_log_group").await
    }

    async fn create_metric_stream(&self, name: &str) -> Result<String, CollaboratorError> {
        self.enter("monitoring.create_metric_stream").await?;
        Ok(format!("{}-dashboard", name))
    }

    async fn create_alarms(
        &self,
        name: &str,
        alarms: &[AlarmSpec],
    ) -> Result<Vec<String>, CollaboratorError> {
        self.enter("monitoring.create_alarms").await?;
        Ok(alarms
            .iter()
            .map(|a| format!("{}-{}", name, a.suffix))
            .collect())
    }

    async fn delete(&self, _name: &str) -> Result<(), CollaboratorError> {
        self.enter("monitoring.delete").await
    }
}

#[async_trait]
impl MetricsSource for MockCloud {
    async fn query(
        &self,
        resource_id: &str,
        _kind: &ScalingTargetKind,
        _window: Duration,
    ) -> Result<MetricsSnapshot, CollaboratorError> {
        self.enter("metrics.query").await?;
        self.state()
            .metrics
            .get(resource_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::Failed(format!("no metrics for {}", resource_id)))
    }
}

#[async_trait]
impl ScalingBackend for MockCloud {
    async fn set_service_capacity(
        &self,
        cluster: &str,
        service: &str,
        desired: u32,
    ) -> Result<(), CollaboratorError> {
        self.enter("scaling.set_service_capacity").await?;
        self.state()
            .capacity_requests
            .push((format!("{}/{}", cluster, service), desired));
        Ok(())
    }

    async fn set_function_concurrency(
        &self,
        function: &str,
        concurrency: u32,
    ) -> Result<(), CollaboratorError> {
        self.enter("scaling.set_function_concurrency").await?;
        self.state()
            .capacity_requests
            .push((function.to_string(), concurrency));
        Ok(())
    }

    async fn register_scalable_target(
        &self,
        _resource_id: &str,
        _policy: &ScalingPolicy,
    ) -> Result<(), CollaboratorError> {
        self.enter("scaling.register_scalable_target").await
    }

    async fn put_scaling_policy(
        &self,
        resource_id: &str,
        _policy: &ScalingPolicy,
    ) -> Result<String, CollaboratorError> {
        self.enter("scaling.put_scaling_policy").await?;
        Ok(format!("arn:aws:autoscaling:mock:policy/{}", resource_id))
    }
}

#[async_trait]
impl InfrastructureClient for MockCloud {
    async fn deploy(&self) -> Result<String, CollaboratorError> {
        self.enter("infrastructure.deploy").await?;
        Ok("Apply complete!".to_string())
    }

    async fn destroy(&self) -> Result<String, CollaboratorError> {
        self.enter("infrastructure.destroy").await?;
        Ok("Destroy complete!".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mock = MockCloud::new();
        mock.create_bucket("b", "us-east-1").await.unwrap();
        mock.configure_website("b").await.unwrap();

        assert_eq!(
            mock.calls(),
            vec!["hosting.create_bucket", "hosting.configure_website"]
        );
        assert!(mock.was_called("hosting.create_bucket"));
        assert!(!mock.was_called("hosting.delete_bucket"));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mock = MockCloud::new();
        mock.fail_on(
            "scaling.set_service_capacity",
            CollaboratorError::PermissionDenied("ecs:UpdateService".into()),
        );

        let err = mock.set_service_capacity("c", "s", 2).await.unwrap_err();
        assert!(err.is_permission_denied());
        assert!(mock.capacity_requests().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_unknown_resource_fails() {
        let mock = MockCloud::new();
        mock.set_metrics("web", MetricsSnapshot::new(50.0, 50.0, 10.0, 2));

        let kind = ScalingTargetKind::Kubernetes;
        let snapshot = mock.query("web", &kind, Duration::from_secs(300)).await.unwrap();
        assert_eq!(snapshot.current_capacity, 2);
        assert!(mock.query("api", &kind, Duration::from_secs(300)).await.is_err());
    }

    #[tokio::test]
    async fn test_rollout_defaults_to_ready() {
        let mock = MockCloud::new();
        let status = mock
            .wait_ready("default", "web", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(status.ready);

        mock.set_rollout(RolloutStatus::timed_out());
        let status = mock
            .wait_ready("default", "web", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(status.status, "timeout");
    }
}
