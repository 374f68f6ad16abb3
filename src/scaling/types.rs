use crate::define_id_enum;
use serde::{Deserialize, Serialize};

define_id_enum! {
    /// Kind of resource a scaling decision is applied to
    ScalingTargetKind {
        /// Container service; resource id is `cluster/service`
        ContainerService => "container-service" | "ecs",
        /// Serverless function; capacity maps to reserved concurrency
        Function => "function" | "lambda",
        /// Orchestrator deployment; resource id is `namespace/deployment` or `deployment`
        Kubernetes => "kubernetes" | "k8s",
    }
}

/// Point-in-time utilization for one resource; absent fields read as 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSnapshot {
    pub cpu_utilization: f64,
    pub memory_utilization: f64,
    pub request_count: f64,
    pub current_capacity: u32,
    /// Average invocation duration in milliseconds (functions only)
    pub duration: f64,
}

impl MetricsSnapshot {
    pub fn new(cpu: f64, memory: f64, requests: f64, capacity: u32) -> Self {
        Self {
            cpu_utilization: cpu,
            memory_utilization: memory,
            request_count: requests,
            current_capacity: capacity,
            duration: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingDirection {
    Up,
    Down,
    None,
}

impl std::fmt::Display for ScalingDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScalingDirection::Up => "up",
            ScalingDirection::Down => "down",
            ScalingDirection::None => "none",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingDecision {
    pub direction: ScalingDirection,
    pub target_capacity: u32,
    pub reason: String,
    pub confidence: f64,
    pub metrics: MetricsSnapshot,
}

/// Target-tracking policy registered for a container service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingPolicy {
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub target_cpu: u32,
    pub scale_in_cooldown: u32,
    pub scale_out_cooldown: u32,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_capacity: 1,
            max_capacity: 10,
            target_cpu: 70,
            scale_in_cooldown: 300,
            scale_out_cooldown: 300,
        }
    }
}

/// Result of applying a decision or registering a policy
///
/// `Degraded` is returned when the service credentials lack permissions; it carries
/// what would have been applied and how an operator can apply it by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScalingOutcome {
    Applied {
        target: String,
        capacity: u32,
        message: String,
    },
    Degraded {
        configuration: serde_json::Value,
        missing_permissions: Vec<String>,
        manual_commands: Vec<String>,
        error: String,
    },
}

impl ScalingOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ScalingOutcome::Degraded { .. })
    }
}
