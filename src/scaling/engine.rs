use super::types::{
    MetricsSnapshot, ScalingDecision, ScalingDirection, ScalingOutcome, ScalingPolicy,
    ScalingTargetKind,
};
use crate::collaborators::aws::split_service_id;
use crate::collaborators::{
    CollaboratorError, Collaborators, MetricsSource, OrchestratorClient, ScalingBackend,
};
use crate::error::{DeployError, DeployResult};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const METRICS_WINDOW: Duration = Duration::from_secs(300);

pub const SCALE_UP_CPU: f64 = 80.0;
pub const SCALE_UP_MEMORY: f64 = 85.0;
pub const SCALE_DOWN_CPU: f64 = 20.0;
pub const SCALE_DOWN_MEMORY: f64 = 30.0;
pub const SCALE_DOWN_REQUESTS: f64 = 10.0;
pub const MAX_CAPACITY: u32 = 20;

const MAX_FUNCTION_CONCURRENCY: u32 = 1000;
const MIN_FUNCTION_CONCURRENCY: u32 = 10;

const CONTAINER_SERVICE_PERMISSIONS: &[&str] = &[
    "ecs:UpdateService",
    "ecs:DescribeServices",
    "ecs:DescribeClusters",
];
const FUNCTION_PERMISSIONS: &[&str] = &["lambda:PutFunctionConcurrency", "lambda:GetFunction"];
const KUBERNETES_PERMISSIONS: &[&str] = &["deployments.apps/scale (update)"];
const POLICY_PERMISSIONS: &[&str] = &[
    "application-autoscaling:RegisterScalableTarget",
    "application-autoscaling:PutScalingPolicy",
    "application-autoscaling:DescribeScalableTargets",
    "application-autoscaling:DescribeScalingPolicies",
];

/// Threshold rule over one snapshot; scale-up wins over scale-down
pub fn decide(metrics: &MetricsSnapshot) -> ScalingDecision {
    let cpu = metrics.cpu_utilization;
    let memory = metrics.memory_utilization;
    let capacity = metrics.current_capacity;

    let (direction, target_capacity, reason, confidence) =
        if cpu > SCALE_UP_CPU || memory > SCALE_UP_MEMORY {
            (
                ScalingDirection::Up,
                capacity.saturating_mul(2).min(MAX_CAPACITY),
                format!("High utilization: CPU {:.1}%, memory {:.1}%", cpu, memory),
                0.9,
            )
        } else if cpu < SCALE_DOWN_CPU
            && memory < SCALE_DOWN_MEMORY
            && metrics.request_count < SCALE_DOWN_REQUESTS
        {
            (
                ScalingDirection::Down,
                (capacity / 2).max(1),
                format!(
                    "Low utilization: CPU {:.1}%, memory {:.1}%, {} requests",
                    cpu, memory, metrics.request_count
                ),
                0.8,
            )
        } else {
            (
                ScalingDirection::None,
                capacity,
                "Utilization within normal range".to_string(),
                0.7,
            )
        };

    ScalingDecision {
        direction,
        target_capacity,
        reason,
        confidence,
        metrics: metrics.clone(),
    }
}

/// Answer given when metrics cannot be retrieved
pub fn degraded_decision(error: &str) -> ScalingDecision {
    ScalingDecision {
        direction: ScalingDirection::None,
        target_capacity: 1,
        reason: format!("Metrics analysis failed: {}", error),
        confidence: 0.0,
        metrics: MetricsSnapshot::default(),
    }
}

/// Reserved concurrency for a function scaled to `target`
pub fn function_concurrency(direction: ScalingDirection, target: u32) -> u32 {
    match direction {
        ScalingDirection::Up => target.saturating_mul(10).min(MAX_FUNCTION_CONCURRENCY),
        _ => target.saturating_mul(5).max(MIN_FUNCTION_CONCURRENCY),
    }
}

fn permissions(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// Decides and applies capacity changes through the injected collaborators
pub struct ScalingEngine {
    metrics: Arc<dyn MetricsSource>,
    backend: Arc<dyn ScalingBackend>,
    orchestrator: Arc<dyn OrchestratorClient>,
    namespace: String,
}

impl ScalingEngine {
    pub fn new(collaborators: &Collaborators, namespace: impl Into<String>) -> Self {
        Self {
            metrics: collaborators.metrics.clone(),
            backend: collaborators.scaling.clone(),
            orchestrator: collaborators.orchestrator.clone(),
            namespace: namespace.into(),
        }
    }

    /// Always returns a decision; metric failures produce the degraded answer
    pub async fn decide_for(&self, resource_id: &str, kind: &ScalingTargetKind) -> ScalingDecision {
        match self.metrics.query(resource_id, kind, METRICS_WINDOW).await {
            Ok(snapshot) => {
                let decision = decide(&snapshot);
                info!(
                    resource = resource_id,
                    kind = %kind,
                    direction = %decision.direction,
                    target = decision.target_capacity,
                    "Scaling decision"
                );
                decision
            }
            Err(e) => {
                warn!(resource = resource_id, error = %e, "Metrics retrieval failed");
                degraded_decision(&e.to_string())
            }
        }
    }

    /// Applies `decision` to `target`
    ///
    /// Permission failures come back as [`ScalingOutcome::Degraded`]; any other
    /// collaborator failure is a [`DeployError::Scaling`].
    pub async fn apply(
        &self,
        kind: &ScalingTargetKind,
        target: &str,
        decision: &ScalingDecision,
    ) -> DeployResult<ScalingOutcome> {
        let capacity = decision.target_capacity;

        match kind {
            ScalingTargetKind::ContainerService => {
                let (cluster, service) = split_service_id(target);
                let result = self
                    .backend
                    .set_service_capacity(cluster, service, capacity)
                    .await;
                self.outcome(
                    result,
                    target,
                    capacity,
                    json!({ "cluster": cluster, "service": service, "desired_count": capacity }),
                    CONTAINER_SERVICE_PERMISSIONS,
                    vec![format!(
                        "aws ecs update-service --cluster {} --service {} --desired-count {}",
                        cluster, service, capacity
                    )],
                )
            }
            ScalingTargetKind::Function => {
                let concurrency = function_concurrency(decision.direction, capacity);
                let result = self
                    .backend
                    .set_function_concurrency(target, concurrency)
                    .await;
                self.outcome(
                    result,
                    target,
                    concurrency,
                    json!({ "function_name": target, "reserved_concurrency": concurrency }),
                    FUNCTION_PERMISSIONS,
                    vec![format!(
                        "aws lambda put-function-concurrency --function-name {} --reserved-concurrent-executions {}",
                        target, concurrency
                    )],
                )
            }
            ScalingTargetKind::Kubernetes => {
                let (namespace, deployment) = match target.split_once('/') {
                    Some((ns, name)) => (ns, name),
                    None => (self.namespace.as_str(), target),
                };
                let result = self
                    .orchestrator
                    .scale(namespace, deployment, capacity)
                    .await
                    .map(|_| ());
                self.outcome(
                    result,
                    target,
                    capacity,
                    json!({ "namespace": namespace, "deployment": deployment, "replicas": capacity }),
                    KUBERNETES_PERMISSIONS,
                    vec![format!(
                        "kubectl scale deployment {} --replicas={} -n {}",
                        deployment, capacity, namespace
                    )],
                )
            }
            ScalingTargetKind::Custom(other) => Err(DeployError::Scaling(format!(
                "unsupported scaling target kind '{}'",
                other
            ))),
        }
    }

    /// Registers a scalable target and a CPU target-tracking policy for a
    /// container service (`cluster/service` or `service`)
    pub async fn create_policy(
        &self,
        service_id: &str,
        policy: &ScalingPolicy,
    ) -> DeployResult<ScalingOutcome> {
        if policy.min_capacity > policy.max_capacity {
            return Err(DeployError::Scaling(format!(
                "min capacity {} exceeds max capacity {}",
                policy.min_capacity, policy.max_capacity
            )));
        }

        let (cluster, service) = split_service_id(service_id);
        let resource_id = format!("service/{}/{}", cluster, service);

        let result = async {
            self.backend
                .register_scalable_target(&resource_id, policy)
                .await?;
            self.backend.put_scaling_policy(&resource_id, policy).await
        }
        .await;

        let configuration = json!({
            "resource_id": resource_id,
            "scalable_dimension": "ecs:service:DesiredCount",
            "min_capacity": policy.min_capacity,
            "max_capacity": policy.max_capacity,
            "target_cpu": policy.target_cpu,
            "scale_in_cooldown": policy.scale_in_cooldown,
            "scale_out_cooldown": policy.scale_out_cooldown,
        });

        match result {
            Ok(policy_arn) => {
                info!(resource = %resource_id, policy = %policy_arn, "Scaling policy created");
                Ok(ScalingOutcome::Applied {
                    target: resource_id,
                    capacity: policy.max_capacity,
                    message: format!("Target tracking policy {} created", policy_arn),
                })
            }
            Err(e) if e.is_permission_denied() => Ok(ScalingOutcome::Degraded {
                configuration,
                missing_permissions: permissions(POLICY_PERMISSIONS),
                manual_commands: vec![
                    format!(
                        "aws application-autoscaling register-scalable-target --service-namespace ecs --resource-id {} --scalable-dimension ecs:service:DesiredCount --min-capacity {} --max-capacity {}",
                        resource_id, policy.min_capacity, policy.max_capacity
                    ),
                    format!(
                        "aws application-autoscaling put-scaling-policy --service-namespace ecs --resource-id {} --scalable-dimension ecs:service:DesiredCount --policy-name {}-scaling-policy --policy-type TargetTrackingScaling --target-tracking-scaling-policy-configuration '{{\"TargetValue\":{},\"PredefinedMetricSpecification\":{{\"PredefinedMetricType\":\"ECSServiceAverageCPUUtilization\"}}}}'",
                        resource_id, service, policy.target_cpu
                    ),
                ],
                error: e.to_string(),
            }),
            Err(e) => Err(DeployError::Scaling(format!(
                "failed to create scaling policy for {}: {}",
                resource_id, e
            ))),
        }
    }

    fn outcome(
        &self,
        result: Result<(), CollaboratorError>,
        target: &str,
        capacity: u32,
        configuration: serde_json::Value,
        required: &[&str],
        manual_commands: Vec<String>,
    ) -> DeployResult<ScalingOutcome> {
        match result {
            Ok(()) => {
                info!(target, capacity, "Scaling applied");
                Ok(ScalingOutcome::Applied {
                    target: target.to_string(),
                    capacity,
                    message: format!("Scaled {} to {}", target, capacity),
                })
            }
            Err(e) if e.is_permission_denied() => {
                warn!(target, error = %e, "Scaling not permitted; returning manual instructions");
                Ok(ScalingOutcome::Degraded {
                    configuration,
                    missing_permissions: permissions(required),
                    manual_commands,
                    error: e.to_string(),
                })
            }
            Err(e) => Err(DeployError::Scaling(format!(
                "failed to scale {}: {}",
                target, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        high_cpu = { 85.0, 50.0, 0.0, 2, ScalingDirection::Up, 4 },
        high_memory = { 10.0, 90.0, 0.0, 3, ScalingDirection::Up, 6 },
        up_is_capped = { 95.0, 95.0, 0.0, 15, ScalingDirection::Up, 20 },
        idle = { 5.0, 10.0, 0.0, 4, ScalingDirection::Down, 2 },
        idle_floor = { 5.0, 10.0, 0.0, 1, ScalingDirection::Down, 1 },
        idle_but_busy = { 5.0, 10.0, 50.0, 4, ScalingDirection::None, 4 },
        steady = { 50.0, 50.0, 50.0, 3, ScalingDirection::None, 3 },
        boundary_cpu_80 = { 80.0, 50.0, 50.0, 2, ScalingDirection::None, 2 },
        boundary_memory_85 = { 50.0, 85.0, 50.0, 2, ScalingDirection::None, 2 },
        idle_at_ten_requests = { 5.0, 10.0, 10.0, 4, ScalingDirection::None, 4 },
    )]
    fn test_decide(
        cpu: f64,
        memory: f64,
        requests: f64,
        capacity: u32,
        direction: ScalingDirection,
        target: u32,
    ) {
        let decision = decide(&MetricsSnapshot::new(cpu, memory, requests, capacity));
        assert_eq!(decision.direction, direction);
        assert_eq!(decision.target_capacity, target);
    }

    #[test]
    fn test_confidence_per_direction() {
        assert_eq!(decide(&MetricsSnapshot::new(85.0, 0.0, 0.0, 2)).confidence, 0.9);
        assert_eq!(decide(&MetricsSnapshot::new(5.0, 10.0, 0.0, 4)).confidence, 0.8);
        assert_eq!(decide(&MetricsSnapshot::new(50.0, 50.0, 50.0, 3)).confidence, 0.7);
    }

    #[test]
    fn test_degraded_decision() {
        let decision = degraded_decision("throttled");
        assert_eq!(decision.direction, ScalingDirection::None);
        assert_eq!(decision.target_capacity, 1);
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.reason.contains("throttled"));
    }

    #[parameterized(
        up = { ScalingDirection::Up, 4, 40 },
        up_capped = { ScalingDirection::Up, 200, 1000 },
        down = { ScalingDirection::Down, 4, 20 },
        down_floor = { ScalingDirection::Down, 1, 10 },
        none = { ScalingDirection::None, 3, 15 },
    )]
    fn test_function_concurrency(direction: ScalingDirection, target: u32, expected: u32) {
        assert_eq!(function_concurrency(direction, target), expected);
    }
}
