//! End-to-end deployment tests against the in-memory collaborators

mod support;

use async_trait::async_trait;
use deployhub::collaborators::{mock::MockCloud, CollaboratorError, RolloutStatus};
use deployhub::pipeline::{Environment, ResourceKind, RollbackStatus};
use deployhub::store::{RecordUpdate, StoreError};
use deployhub::{
    Collaborators, DeployError, DeploymentFilter, DeploymentPipeline, DeploymentRecord,
    DeploymentRequest, DeploymentStatus, DeploymentStore, InMemoryDeploymentStore, ProjectType,
    RollbackRequest,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use support::{pipeline, react_project, static_site, BASE_DOMAIN};
use tempfile::TempDir;
use uuid::Uuid;

fn names(record: &DeploymentRecord, kind: ResourceKind) -> Vec<String> {
    record
        .resources_created
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.name.clone())
        .collect()
}

async fn deploy(pipeline: &DeploymentPipeline, request: DeploymentRequest) -> DeploymentRecord {
    let id = pipeline.submit(request).await.unwrap();
    pipeline.wait(id).await.unwrap()
}

#[tokio::test]
async fn test_react_deployment_succeeds() {
    let projects = TempDir::new().unwrap();
    let project_dir = react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    assert_eq!(record.progress, 100);
    assert!(record.errors.is_empty());
    assert!(record.resources_failed.is_empty());
    assert_eq!(
        record.profile.as_ref().map(|p| p.project_type),
        Some(ProjectType::React)
    );

    let artifacts = names(&record, ResourceKind::Artifact);
    assert!(artifacts.contains(&"Dockerfile".to_string()));
    assert!(artifacts.contains(&"docker-compose.yml".to_string()));
    assert!(artifacts.contains(&"nginx.conf".to_string()));
    assert!(project_dir.join("Dockerfile").exists());

    assert_eq!(names(&record, ResourceKind::Build), vec!["Build artifacts"]);
    assert_eq!(names(&record, ResourceKind::ContainerImage).len(), 1);
    assert!(record.image.as_deref().is_some_and(|i| i.starts_with("demo:")));

    let bucket = format!("demo-production-{}", record.short_id());
    assert_eq!(
        names(&record, ResourceKind::Storage),
        vec![format!("s3://{}", bucket)]
    );
    assert_eq!(record.bucket.as_deref(), Some(bucket.as_str()));
    assert_eq!(names(&record, ResourceKind::Cdn).len(), 1);
    assert!(record.distribution_id.is_some());

    let monitoring = names(&record, ResourceKind::Monitoring);
    assert!(monitoring.contains(&"Log group /deployhub/demo".to_string()));
    assert!(monitoring.contains(&"Metric stream demo-dashboard".to_string()));
    assert!(monitoring.contains(&"Alarm demo-high-cpu".to_string()));

    assert_eq!(
        record.url.as_deref(),
        Some(format!("https://demo.{}", BASE_DOMAIN).as_str())
    );
    assert!(record.metrics_url.is_some());
    assert!(record.logs_url.is_some());
    assert!(!mock.was_called("orchestrator.apply"));
}

#[tokio::test]
async fn test_build_output_uploaded_with_content_types() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    assert_eq!(record.status, DeploymentStatus::Success);

    let uploads = mock.uploads();
    let keys: Vec<&str> = uploads.iter().map(|u| u.key.as_str()).collect();
    assert_eq!(keys, vec!["index.html", "static/app.js"]);

    let html = &uploads[0];
    assert!(html.content_type.starts_with("text/html"));
    assert!(html.cache_control.contains("must-revalidate"));
    assert!(uploads[1].content_type.starts_with("application/javascript"));
    assert!(uploads[1].cache_control.contains("max-age=31536000"));
}

#[tokio::test]
async fn test_static_site_published_from_project_root() {
    let projects = TempDir::new().unwrap();
    static_site(projects.path(), "landing");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("landing");
    request.enable_containerization = false;
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    assert!(names(&record, ResourceKind::Artifact).is_empty());
    assert!(!mock.was_called("runtime.build"));
    assert!(!mock.was_called("build.run"));

    let keys: Vec<String> = mock.uploads().into_iter().map(|u| u.key).collect();
    assert!(keys.contains(&"index.html".to_string()));
    assert!(keys.contains(&"css/site.css".to_string()));
}

#[tokio::test]
async fn test_type_hint_does_not_replace_detection() {
    let projects = TempDir::new().unwrap();
    static_site(projects.path(), "site");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("site");
    request.project_type = Some(ProjectType::Python);
    request.enable_monitoring = false;
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    assert_eq!(record.options.project_type, Some(ProjectType::Python));
    let profile = record.profile.as_ref().unwrap();
    assert_eq!(profile.project_type, ProjectType::Static);
    assert!(profile.confidence_score < 1.0);
    assert!(record
        .logs
        .iter()
        .any(|l| l.message.contains("Requested project type python differs from detected static")));
    assert!(names(&record, ResourceKind::Monitoring).is_empty());
    assert!(!mock.was_called("monitoring.create_log_group"));
}

#[tokio::test]
async fn test_matching_type_hint_logs_nothing_extra() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("demo");
    request.project_type = Some(ProjectType::React);
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    assert_eq!(
        record.profile.as_ref().map(|p| p.project_type),
        Some(ProjectType::React)
    );
    assert!(!record
        .logs
        .iter()
        .any(|l| l.message.starts_with("Requested project type")));
}

#[tokio::test]
async fn test_build_failure_marks_deployment_failed() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "build.run",
        CollaboratorError::Failed("npm ERR! missing script: build".to_string()),
    );
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert_eq!(record.progress, 0);
    assert_eq!(record.errors.len(), 1);
    assert!(record.errors[0].contains("building stage failed"));
    assert!(record.errors[0].contains("npm ERR! missing script"));
    assert!(record.url.is_none());
    assert!(!mock.was_called("hosting.create_bucket"));
    assert!(record
        .logs
        .iter()
        .any(|l| l.message.starts_with("Deployment failed")));
}

#[tokio::test]
async fn test_hosting_failure_keeps_earlier_resources() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "hosting.create_bucket",
        CollaboratorError::Failed("BucketAlreadyExists".to_string()),
    );
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.errors[0].contains("deploying stage failed"));
    assert!(record.errors[0].contains("BucketAlreadyExists"));
    assert_eq!(names(&record, ResourceKind::Build), vec!["Build artifacts"]);
    assert!(names(&record, ResourceKind::Storage).is_empty());
}

#[tokio::test]
async fn test_cdn_failure_still_records_bucket_for_cleanup() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "hosting.create_distribution",
        CollaboratorError::Failed("TooManyDistributions".to_string()),
    );
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.errors[0].contains("TooManyDistributions"));
    let bucket = record.bucket.clone().unwrap();
    assert_eq!(names(&record, ResourceKind::Storage), vec![format!("s3://{}", bucket)]);
    assert!(record.distribution_id.is_none());
    assert!(names(&record, ResourceKind::Cdn).is_empty());

    pipeline.delete(record.id).await.unwrap();
    assert!(mock.was_called("hosting.delete_bucket"));
    assert!(!mock.was_called("hosting.delete_distribution"));
}

#[tokio::test]
async fn test_missing_project_directory_fails_detection() {
    let projects = TempDir::new().unwrap();
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("ghost")).await;

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert!(record.errors[0].contains("detecting stage failed"));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_panic_in_collaborator_is_recorded() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.panic_on("hosting.create_bucket");
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;

    assert_eq!(record.status, DeploymentStatus::Failed);
    assert_eq!(record.progress, 0);
    assert!(record.errors[0].starts_with("execution panicked:"));
    assert!(record.errors[0].contains("hosting.create_bucket"));
    assert!(!pipeline.is_running(record.id));
}

/// Store that remembers the progress value after every update
struct RecordingStore {
    inner: InMemoryDeploymentStore,
    progress: Mutex<Vec<u8>>,
}

#[async_trait]
impl DeploymentStore for RecordingStore {
    async fn get(&self, id: Uuid) -> Result<DeploymentRecord, StoreError> {
        self.inner.get(id).await
    }

    async fn put(&self, record: DeploymentRecord) -> Result<(), StoreError> {
        self.inner.put(record).await
    }

    async fn delete(&self, id: Uuid) -> Result<DeploymentRecord, StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self, filter: &DeploymentFilter) -> Result<Vec<DeploymentRecord>, StoreError> {
        self.inner.list(filter).await
    }

    async fn update(&self, id: Uuid, update: RecordUpdate) -> Result<DeploymentRecord, StoreError> {
        let record = self.inner.update(id, update).await?;
        self.progress.lock().unwrap().push(record.progress);
        Ok(record)
    }
}

#[tokio::test]
async fn test_progress_never_decreases_on_success() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let store = Arc::new(RecordingStore {
        inner: InMemoryDeploymentStore::new(),
        progress: Mutex::new(Vec::new()),
    });
    let pipeline = DeploymentPipeline::with_store(
        support::config(projects.path()),
        Collaborators::mock(mock.clone()),
        store.clone(),
    );

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    assert_eq!(record.status, DeploymentStatus::Success);

    let seen = store.progress.lock().unwrap().clone();
    assert!(seen.len() > 5);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
    assert_eq!(seen.last(), Some(&100));
    for checkpoint in [10, 15, 25, 30, 40, 45, 60, 70, 80] {
        assert!(seen.contains(&checkpoint), "missing {} in {:?}", checkpoint, seen);
    }
}

#[tokio::test]
async fn test_kubernetes_deployment_with_autoscaler() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("demo");
    request.enable_kubernetes = true;
    request.enable_auto_scaling = true;
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    let applied = mock.applied();
    assert!(applied.contains(&"deployment/demo".to_string()));
    assert!(applied.contains(&"horizontalpodautoscaler/demo-hpa".to_string()));
    assert!(mock.was_called("orchestrator.wait_ready"));
    assert_eq!(
        names(&record, ResourceKind::Scaling),
        vec!["horizontalpodautoscaler/demo-hpa (apps)"]
    );
    assert!(names(&record, ResourceKind::Kubernetes)
        .contains(&"deployment/demo (apps)".to_string()));
}

#[tokio::test]
async fn test_rollout_timeout_is_a_warning() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.set_rollout(RolloutStatus::timed_out());
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("demo");
    request.enable_kubernetes = true;
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success);
    assert_eq!(record.resources_failed.len(), 1);
    assert_eq!(record.resources_failed[0].kind, ResourceKind::Kubernetes);
    assert!(record
        .logs
        .iter()
        .any(|l| l.message.starts_with("Warning:") && l.message.contains("timeout")));
    assert!(mock.was_called("hosting.create_distribution"));
}

#[tokio::test]
async fn test_scaling_permission_gap_does_not_fail_deployment() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "scaling.register_scalable_target",
        CollaboratorError::PermissionDenied(
            "AccessDeniedException: not authorized to perform: application-autoscaling:RegisterScalableTarget"
                .to_string(),
        ),
    );
    let pipeline = pipeline(&mock, projects.path());

    let mut request = DeploymentRequest::new("demo");
    request.enable_auto_scaling = true;
    let record = deploy(&pipeline, request).await;

    assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
    assert!(names(&record, ResourceKind::Scaling).is_empty());
    assert_eq!(record.resources_failed.len(), 1);
    assert_eq!(record.resources_failed[0].name, "Scaling policy demo");
    let warning = record
        .logs
        .iter()
        .find(|l| l.message.starts_with("Warning:"))
        .unwrap();
    assert!(warning.message.contains("application-autoscaling:RegisterScalableTarget"));
    assert!(warning.message.contains("aws application-autoscaling register-scalable-target"));
    assert!(!mock.was_called("scaling.put_scaling_policy"));
}

#[tokio::test]
async fn test_cancel_running_deployment() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.set_delay(Duration::from_millis(200));
    let pipeline = pipeline(&mock, projects.path());

    let id = pipeline.submit(DeploymentRequest::new("demo")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(pipeline.cancel(id));

    let record = pipeline.wait(id).await.unwrap();
    assert_eq!(record.status, DeploymentStatus::Failed);
    assert_eq!(record.errors, vec!["cancelled"]);
    assert!(!pipeline.is_running(id));
    assert!(!pipeline.cancel(id));
    assert!(!mock.was_called("monitoring.create_log_group"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deployments_run_in_parallel() {
    let projects = TempDir::new().unwrap();
    let names_in_flight = ["alpha", "bravo", "charlie", "delta"];
    react_project(projects.path(), "solo");
    for name in names_in_flight {
        react_project(projects.path(), name);
    }
    let mock = Arc::new(MockCloud::new());
    mock.set_delay(Duration::from_millis(40));
    let pipeline = pipeline(&mock, projects.path());

    let started = Instant::now();
    let solo = deploy(&pipeline, DeploymentRequest::new("solo")).await;
    let single = started.elapsed();
    assert_eq!(solo.status, DeploymentStatus::Success, "{:?}", solo.errors);

    let started = Instant::now();
    let mut ids = Vec::new();
    for name in names_in_flight {
        ids.push(pipeline.submit(DeploymentRequest::new(name)).await.unwrap());
    }
    let mut records = Vec::new();
    for id in ids {
        records.push(pipeline.wait(id).await.unwrap());
    }
    let together = started.elapsed();

    assert!(
        together < single * 2,
        "{} deployments took {:?}, one took {:?}",
        names_in_flight.len(),
        together,
        single
    );

    for (record, name) in records.iter().zip(names_in_flight) {
        assert_eq!(record.status, DeploymentStatus::Success, "{:?}", record.errors);
        assert_eq!(record.project_name, name);

        let storage = names(record, ResourceKind::Storage);
        assert_eq!(storage.len(), 1);
        assert!(storage[0].contains(name));
        assert!(storage[0].contains(&record.short_id()));
        assert!(record
            .bucket
            .as_deref()
            .is_some_and(|b| b.starts_with(&format!("{}-", name))));

        for resource in &record.resources_created {
            for other in names_in_flight.iter().filter(|n| **n != name) {
                assert!(
                    !resource.name.contains(other),
                    "{} holds {} from {}",
                    name,
                    resource.name,
                    other
                );
            }
        }
    }
}

#[tokio::test]
async fn test_submit_rejects_invalid_name() {
    let projects = TempDir::new().unwrap();
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let err = pipeline
        .submit(DeploymentRequest::new("bad name!"))
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::Validation(_)));
    assert_eq!(err.kind(), "validation_error");
    assert!(pipeline
        .list(&DeploymentFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_get_unknown_deployment() {
    let projects = TempDir::new().unwrap();
    let pipeline = pipeline(&Arc::new(MockCloud::new()), projects.path());

    let err = pipeline.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DeployError::NotFound { .. }));
}

#[tokio::test]
async fn test_list_filters_by_environment() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    deploy(&pipeline, DeploymentRequest::new("demo")).await;
    let mut staging = DeploymentRequest::new("demo");
    staging.environment = Environment::Staging;
    let staged = deploy(&pipeline, staging).await;

    let all = pipeline.list(&DeploymentFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let filter = DeploymentFilter {
        environment: Some(Environment::Staging),
        ..DeploymentFilter::default()
    };
    let filtered = pipeline.list(&filter).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, staged.id);
    assert!(filtered[0]
        .bucket
        .as_deref()
        .is_some_and(|b| b.starts_with("demo-staging-")));
}

#[tokio::test]
async fn test_delete_cleans_up_and_removes() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    pipeline.delete(record.id).await.unwrap();

    assert!(mock.was_called("hosting.delete_distribution"));
    assert!(mock.was_called("hosting.delete_bucket"));
    assert!(mock.was_called("runtime.stop"));
    assert!(mock.was_called("monitoring.delete"));
    assert!(!mock.was_called("orchestrator.delete"));
    assert!(matches!(
        pipeline.get(record.id).await,
        Err(DeployError::NotFound { .. })
    ));
    assert!(matches!(
        pipeline.delete(record.id).await,
        Err(DeployError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_tolerates_cleanup_failures() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    mock.fail_on(
        "hosting.delete_bucket",
        CollaboratorError::Failed("BucketNotEmpty".to_string()),
    );

    pipeline.delete(record.id).await.unwrap();
    assert!(pipeline.get(record.id).await.is_err());
}

#[tokio::test]
async fn test_rollback_leaves_deployment_untouched() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    let request = RollbackRequest {
        target_version: Some("v1".to_string()),
        ..RollbackRequest::default()
    };
    let rollback_id = pipeline.rollback(record.id, request).await.unwrap();
    assert_ne!(rollback_id, record.id);

    let rollback = pipeline.wait_rollback(rollback_id).await.unwrap();
    assert_eq!(rollback.status, RollbackStatus::Completed);
    assert_eq!(rollback.deployment_id, record.id);
    assert!(rollback
        .logs
        .iter()
        .any(|l| l.message.contains("to v1")));
    assert!(rollback
        .logs
        .iter()
        .any(|l| l.message == "Data volumes preserved"));

    let after = pipeline.get(record.id).await.unwrap();
    assert_eq!(after, record);
}

#[tokio::test]
async fn test_delete_drops_rollback_records() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    let pipeline = pipeline(&mock, projects.path());

    let record = deploy(&pipeline, DeploymentRequest::new("demo")).await;
    let rollback_id = pipeline
        .rollback(record.id, RollbackRequest::default())
        .await
        .unwrap();
    pipeline.wait_rollback(rollback_id).await.unwrap();
    assert!(pipeline.get_rollback(rollback_id).await.is_ok());

    pipeline.delete(record.id).await.unwrap();

    assert!(matches!(
        pipeline.get_rollback(rollback_id).await,
        Err(DeployError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_rollback_of_running_deployment_needs_force() {
    let projects = TempDir::new().unwrap();
    react_project(projects.path(), "demo");
    let mock = Arc::new(MockCloud::new());
    mock.set_delay(Duration::from_millis(200));
    let pipeline = pipeline(&mock, projects.path());

    let id = pipeline.submit(DeploymentRequest::new("demo")).await.unwrap();
    let rollback_id = pipeline
        .rollback(id, RollbackRequest::default())
        .await
        .unwrap();
    let rollback = pipeline.wait_rollback(rollback_id).await.unwrap();
    assert_eq!(rollback.status, RollbackStatus::Failed);

    let forced = pipeline
        .rollback(
            id,
            RollbackRequest {
                force: true,
                ..RollbackRequest::default()
            },
        )
        .await
        .unwrap();
    let forced = pipeline.wait_rollback(forced).await.unwrap();
    assert_eq!(forced.status, RollbackStatus::Completed);

    pipeline.cancel(id);
    pipeline.wait(id).await.unwrap();
}

#[tokio::test]
async fn test_rollback_unknown_deployment() {
    let projects = TempDir::new().unwrap();
    let pipeline = pipeline(&Arc::new(MockCloud::new()), projects.path());

    let err = pipeline
        .rollback(Uuid::new_v4(), RollbackRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DeployError::NotFound { .. }));
    assert!(pipeline.get_rollback(Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn test_infrastructure_permission_gap_is_degraded() {
    let projects = TempDir::new().unwrap();
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "infrastructure.deploy",
        CollaboratorError::PermissionDenied(
            "Error: not authorized to perform: iam:CreateRole on resource".to_string(),
        ),
    );
    let pipeline = pipeline(&mock, projects.path());

    let outcome = pipeline.provision_infrastructure().await.unwrap();
    assert!(outcome.is_degraded());
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["missing_permissions"][0], "iam:CreateRole");
    assert!(json["manual_command"]
        .as_str()
        .unwrap()
        .ends_with("apply -auto-approve"));

    let destroyed = pipeline.destroy_infrastructure().await.unwrap();
    assert!(!destroyed.is_degraded());
}

#[tokio::test]
async fn test_infrastructure_other_failure_is_error() {
    let projects = TempDir::new().unwrap();
    let mock = Arc::new(MockCloud::new());
    mock.fail_on(
        "infrastructure.destroy",
        CollaboratorError::Failed("state locked".to_string()),
    );
    let pipeline = pipeline(&mock, projects.path());

    let err = pipeline.destroy_infrastructure().await.unwrap_err();
    assert_eq!(err.kind(), "deployment_error");
    assert!(err.to_string().contains("state locked"));
}
