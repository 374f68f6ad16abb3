use super::CollaboratorError;
use crate::scaling::{MetricsSnapshot, ScalingPolicy, ScalingTargetKind};
use async_trait::async_trait;
use std::time::Duration;

/// Utilization metrics for a running resource
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn query(
        &self,
        resource_id: &str,
        kind: &ScalingTargetKind,
        window: Duration,
    ) -> Result<MetricsSnapshot, CollaboratorError>;
}

/// Cloud-side capacity controls
#[async_trait]
pub trait ScalingBackend: Send + Sync {
    async fn set_service_capacity(
        &self,
        cluster: &str,
        service: &str,
        desired: u32,
    ) -> Result<(), CollaboratorError>;

    async fn set_function_concurrency(
        &self,
        function: &str,
        concurrency: u32,
    ) -> Result<(), CollaboratorError>;

    async fn register_scalable_target(
        &self,
        resource_id: &str,
        policy: &ScalingPolicy,
    ) -> Result<(), CollaboratorError>;

    /// Target-tracking policy on CPU; returns the policy ARN or name
    async fn put_scaling_policy(
        &self,
        resource_id: &str,
        policy: &ScalingPolicy,
    ) -> Result<String, CollaboratorError>;
}
