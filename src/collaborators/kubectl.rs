use super::command::CliCommand;
use super::orchestrator::{ApplyResult, OrchestratorClient, RolloutStatus, WorkloadStatus};
use super::CollaboratorError;
use crate::kubernetes::ManifestSet;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Grace period on top of kubectl's own `--timeout` before the process is killed
const KILL_GRACE: Duration = Duration::from_secs(10);

/// [`OrchestratorClient`] driving the `kubectl` binary
pub struct KubectlClient {
    binary: String,
    context: Option<String>,
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl KubectlClient {
    pub fn new() -> Self {
        Self {
            binary: "kubectl".to_string(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn command(&self) -> CliCommand {
        let cmd = CliCommand::new(&self.binary);
        match &self.context {
            Some(ctx) => cmd.arg(format!("--context={}", ctx)),
            None => cmd,
        }
    }
}

fn replicas(status: &Value, field: &str) -> u32 {
    status[field].as_u64().unwrap_or(0) as u32
}

fn workload_status(namespace: &str, deployment: &str, document: &Value) -> WorkloadStatus {
    let status = &document["status"];
    WorkloadStatus {
        name: deployment.to_string(),
        namespace: namespace.to_string(),
        replicas: replicas(status, "replicas"),
        ready_replicas: replicas(status, "readyReplicas"),
        available_replicas: replicas(status, "availableReplicas"),
    }
}

#[async_trait]
impl OrchestratorClient for KubectlClient {
    async fn apply(&self, manifests: &ManifestSet) -> Result<Vec<ApplyResult>, CollaboratorError> {
        let mut results = Vec::with_capacity(manifests.manifests.len());

        for manifest in &manifests.manifests {
            let yaml = serde_yaml::to_string(&manifest.document).map_err(|e| {
                CollaboratorError::Failed(format!("cannot render {}: {}", manifest.reference(), e))
            })?;

            let outcome = self
                .command()
                .args(["apply", "-n", manifests.namespace.as_str(), "-f", "-"])
                .stdin(yaml)
                .run()
                .await;

            let result = match outcome {
                Ok(output) => ApplyResult {
                    manifest: manifest.reference(),
                    success: true,
                    output: output.stdout.trim().to_string(),
                    error: None,
                },
                Err(CollaboratorError::Unavailable(msg)) => {
                    return Err(CollaboratorError::Unavailable(msg))
                }
                Err(e) => {
                    warn!(manifest = %manifest.reference(), error = %e, "kubectl apply failed");
                    ApplyResult {
                        manifest: manifest.reference(),
                        success: false,
                        output: String::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    async fn scale(
        &self,
        namespace: &str,
        deployment: &str,
        replicas: u32,
    ) -> Result<String, CollaboratorError> {
        let output = self
            .command()
            .args(["scale", "deployment", deployment])
            .arg(format!("--replicas={}", replicas))
            .args(["-n", namespace])
            .run()
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    async fn wait_ready(
        &self,
        namespace: &str,
        deployment: &str,
        timeout: Duration,
    ) -> Result<RolloutStatus, CollaboratorError> {
        let result = self
            .command()
            .args(["rollout", "status"])
            .arg(format!("deployment/{}", deployment))
            .args(["-n", namespace])
            .arg(format!("--timeout={}s", timeout.as_secs()))
            .timeout(timeout + KILL_GRACE)
            .run()
            .await;

        match result {
            Ok(_) => Ok(RolloutStatus::ready()),
            Err(CollaboratorError::Timeout(_)) => Ok(RolloutStatus::timed_out()),
            Err(CollaboratorError::Failed(msg)) if msg.contains("timed out") => {
                debug!(deployment, "Rollout wait elapsed");
                Ok(RolloutStatus::timed_out())
            }
            Err(e) => Err(e),
        }
    }

    async fn get(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<WorkloadStatus, CollaboratorError> {
        let document = self
            .command()
            .args(["get", "deployment", deployment, "-n", namespace, "-o", "json"])
            .run_json()
            .await?;
        Ok(workload_status(namespace, deployment, &document))
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), CollaboratorError> {
        self.command()
            .args(["delete", "deployment,service,ingress,hpa"])
            .arg("-l")
            .arg(format!("app={}", name))
            .args(["-n", namespace, "--ignore-not-found"])
            .run()
            .await?;
        Ok(())
    }
}
