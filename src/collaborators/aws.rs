//! Cloud collaborators implemented on top of the `aws` CLI
//!
//! Every call runs `aws <service> <operation> ... --output json`; authorization
//! failures in the CLI's stderr are classified as `PermissionDenied`.

use super::command::CliCommand;
use super::hosting::{CloudHostingClient, Distribution};
use super::monitoring::{default_alarms, AlarmSpec, MonitoringClient};
use super::scaling::{MetricsSource, ScalingBackend};
use super::CollaboratorError;
use crate::scaling::{MetricsSnapshot, ScalingPolicy, ScalingTargetKind};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const METRIC_PERIOD_SECS: u64 = 300;
const DEFAULT_CLUSTER: &str = "default";

pub struct AwsCliClient {
    region: String,
}

impl AwsCliClient {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    fn aws<I, S>(&self, args: I) -> CliCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CliCommand::new("aws")
            .args(args)
            .args(["--region", self.region.as_str(), "--output", "json"])
    }

    /// Latest datapoint of one CloudWatch statistic, if any
    async fn statistic(
        &self,
        namespace: &str,
        metric: &str,
        dimensions: &[(&str, &str)],
        statistic: &str,
        window: Duration,
    ) -> Result<Option<f64>, CollaboratorError> {
        let end = Utc::now();
        let start = end
            - chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::minutes(5));

        let mut cmd = self
            .aws(["cloudwatch", "get-metric-statistics"])
            .args(["--namespace", namespace, "--metric-name", metric])
            .arg("--dimensions");
        for (name, value) in dimensions {
            cmd = cmd.arg(format!("Name={},Value={}", name, value));
        }
        let response = cmd
            .arg("--start-time")
            .arg(start.to_rfc3339())
            .arg("--end-time")
            .arg(end.to_rfc3339())
            .arg("--period")
            .arg(METRIC_PERIOD_SECS.to_string())
            .args(["--statistics", statistic])
            .run_json()
            .await?;

        Ok(latest_datapoint(&response, statistic))
    }
}

/// Datapoints come back unordered; pick the newest by timestamp
fn latest_datapoint(response: &Value, statistic: &str) -> Option<f64> {
    response["Datapoints"]
        .as_array()?
        .iter()
        .max_by(|a, b| {
            a["Timestamp"]
                .as_str()
                .unwrap_or_default()
                .cmp(b["Timestamp"].as_str().unwrap_or_default())
        })
        .and_then(|point| point[statistic].as_f64())
}

/// `cluster/service` or a bare service name in the default cluster
pub fn split_service_id(resource_id: &str) -> (&str, &str) {
    match resource_id.split_once('/') {
        Some((cluster, service)) => (cluster, service),
        None => (DEFAULT_CLUSTER, resource_id),
    }
}

#[async_trait]
impl CloudHostingClient for AwsCliClient {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), CollaboratorError> {
        let mut cmd = CliCommand::new("aws")
            .args(["s3api", "create-bucket", "--bucket", bucket, "--region", region]);
        if region != "us-east-1" {
            cmd = cmd
                .arg("--create-bucket-configuration")
                .arg(format!("LocationConstraint={}", region));
        }
        cmd.run().await?;
        Ok(())
    }

    async fn configure_website(&self, bucket: &str) -> Result<(), CollaboratorError> {
        self.aws(["s3", "website"])
            .arg(format!("s3://{}", bucket))
            .args(["--index-document", "index.html", "--error-document", "index.html"])
            .run()
            .await?;
        Ok(())
    }

    async fn set_public_read_policy(&self, bucket: &str) -> Result<(), CollaboratorError> {
        self.aws(["s3api", "put-public-access-block", "--bucket", bucket])
            .arg("--public-access-block-configuration")
            .arg("BlockPublicAcls=false,IgnorePublicAcls=false,BlockPublicPolicy=false,RestrictPublicBuckets=false")
            .run()
            .await?;

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{}/*", bucket),
            }],
        });
        self.aws(["s3api", "put-bucket-policy", "--bucket", bucket])
            .arg("--policy")
            .arg(policy.to_string())
            .run()
            .await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), CollaboratorError> {
        self.aws(["s3", "cp", "-"])
            .arg(format!("s3://{}/{}", bucket, key))
            .args(["--content-type", content_type, "--cache-control", cache_control])
            .stdin(body)
            .run()
            .await?;
        Ok(())
    }

    async fn create_distribution(
        &self,
        bucket: &str,
        region: &str,
    ) -> Result<Distribution, CollaboratorError> {
        let origin = format!("{}.s3-website-{}.amazonaws.com", bucket, region);
        let response = self
            .aws(["cloudfront", "create-distribution"])
            .args(["--origin-domain-name", origin.as_str()])
            .args(["--default-root-object", "index.html"])
            .run_json()
            .await?;
        distribution_from(&response)
    }

    async fn get_distribution(&self, id: &str) -> Result<Distribution, CollaboratorError> {
        let response = self
            .aws(["cloudfront", "get-distribution", "--id", id])
            .run_json()
            .await?;
        distribution_from(&response)
    }

    async fn delete_distribution(&self, id: &str) -> Result<(), CollaboratorError> {
        let config = self
            .aws(["cloudfront", "get-distribution-config", "--id", id])
            .run_json()
            .await?;
        let etag = config["ETag"]
            .as_str()
            .ok_or_else(|| CollaboratorError::Failed(format!("distribution {} has no ETag", id)))?;

        self.aws(["cloudfront", "delete-distribution", "--id", id, "--if-match", etag])
            .run()
            .await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), CollaboratorError> {
        self.aws(["s3", "rb"])
            .arg(format!("s3://{}", bucket))
            .arg("--force")
            .run()
            .await?;
        Ok(())
    }
}

fn distribution_from(response: &Value) -> Result<Distribution, CollaboratorError> {
    let dist = &response["Distribution"];
    let id = dist["Id"]
        .as_str()
        .ok_or_else(|| CollaboratorError::Failed("CloudFront response has no Distribution.Id".into()))?;
    Ok(Distribution {
        id: id.to_string(),
        domain_name: dist["DomainName"].as_str().unwrap_or_default().to_string(),
        status: dist["Status"].as_str().unwrap_or("InProgress").to_string(),
    })
}

#[async_trait]
impl MonitoringClient for AwsCliClient {
    async fn create_log_group(
        &self,
        name: &str,
        retention_days: u32,
    ) -> Result<(), CollaboratorError> {
        match self
            .aws(["logs", "create-log-group", "--log-group-name", name])
            .run()
            .await
        {
            Ok(_) => {}
            Err(CollaboratorError::Failed(msg)) if msg.contains("ResourceAlreadyExists") => {
                debug!(log_group = name, "Log group already exists");
            }
            Err(e) => return Err(e),
        }

        self.aws(["logs", "put-retention-policy", "--log-group-name", name])
            .arg("--retention-in-days")
            .arg(retention_days.to_string())
            .run()
            .await?;
        Ok(())
    }

    async fn create_metric_stream(&self, name: &str) -> Result<String, CollaboratorError> {
        let dashboard = format!("{}-dashboard", name);
        let body = json!({
            "widgets": [{
                "type": "metric",
                "width": 12,
                "height": 6,
                "properties": {
                    "title": format!("{} utilization", name),
                    "region": self.region,
                    "stat": "Average",
                    "period": METRIC_PERIOD_SECS,
                    "metrics": [
                        ["AWS/ECS", "CPUUtilization", "ServiceName", name],
                        ["AWS/ECS", "MemoryUtilization", "ServiceName", name],
                    ],
                },
            }],
        });
        self.aws(["cloudwatch", "put-dashboard", "--dashboard-name", dashboard.as_str()])
            .arg("--dashboard-body")
            .arg(body.to_string())
            .run()
            .await?;
        Ok(dashboard)
    }

    async fn create_alarms(
        &self,
        name: &str,
        alarms: &[AlarmSpec],
    ) -> Result<Vec<String>, CollaboratorError> {
        let mut created = Vec::with_capacity(alarms.len());
        for alarm in alarms {
            let alarm_name = format!("{}-{}", name, alarm.suffix);
            self.aws(["cloudwatch", "put-metric-alarm", "--alarm-name", alarm_name.as_str()])
                .args(["--alarm-description", alarm.description.as_str()])
                .args(["--metric-name", alarm.metric.as_str(), "--namespace", "AWS/ECS"])
                .args(["--statistic", "Average", "--period", "300"])
                .arg("--threshold")
                .arg(alarm.threshold.to_string())
                .args(["--comparison-operator", "GreaterThanThreshold"])
                .args(["--evaluation-periods", "2"])
                .arg("--dimensions")
                .arg(format!("Name=ServiceName,Value={}", name))
                .run()
                .await?;
            created.push(alarm_name);
        }
        Ok(created)
    }

    async fn delete(&self, name: &str) -> Result<(), CollaboratorError> {
        let alarm_names: Vec<String> = default_alarms()
            .iter()
            .map(|a| format!("{}-{}", name, a.suffix))
            .collect();
        self.aws(["cloudwatch", "delete-alarms", "--alarm-names"])
            .args(alarm_names)
            .run()
            .await?;
        self.aws(["cloudwatch", "delete-dashboards", "--dashboard-names"])
            .arg(format!("{}-dashboard", name))
            .run()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MetricsSource for AwsCliClient {
    async fn query(
        &self,
        resource_id: &str,
        kind: &ScalingTargetKind,
        window: Duration,
    ) -> Result<MetricsSnapshot, CollaboratorError> {
        let mut snapshot = MetricsSnapshot::default();

        match kind {
            ScalingTargetKind::ContainerService => {
                let (cluster, service) = split_service_id(resource_id);
                let dims = [("ServiceName", service), ("ClusterName", cluster)];
                if let Some(cpu) = self
                    .statistic("AWS/ECS", "CPUUtilization", &dims, "Average", window)
                    .await?
                {
                    snapshot.cpu_utilization = cpu;
                }
                if let Some(mem) = self
                    .statistic("AWS/ECS", "MemoryUtilization", &dims, "Average", window)
                    .await?
                {
                    snapshot.memory_utilization = mem;
                }

                let described = self
                    .aws(["ecs", "describe-services", "--cluster", cluster, "--services", service])
                    .run_json()
                    .await?;
                snapshot.current_capacity =
                    described["services"][0]["runningCount"].as_u64().unwrap_or(0) as u32;
            }
            ScalingTargetKind::Function => {
                let dims = [("FunctionName", resource_id)];
                if let Some(duration) = self
                    .statistic("AWS/Lambda", "Duration", &dims, "Average", window)
                    .await?
                {
                    snapshot.duration = duration;
                }
                if let Some(invocations) = self
                    .statistic("AWS/Lambda", "Invocations", &dims, "Sum", window)
                    .await?
                {
                    snapshot.request_count = invocations;
                    snapshot.current_capacity = invocations.min(100.0) as u32;
                }
            }
            other => {
                return Err(CollaboratorError::Failed(format!(
                    "CloudWatch has no metrics for {} resources",
                    other
                )))
            }
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl ScalingBackend for AwsCliClient {
    async fn set_service_capacity(
        &self,
        cluster: &str,
        service: &str,
        desired: u32,
    ) -> Result<(), CollaboratorError> {
        self.aws(["ecs", "update-service", "--cluster", cluster, "--service", service])
            .arg("--desired-count")
            .arg(desired.to_string())
            .run()
            .await?;
        Ok(())
    }

    async fn set_function_concurrency(
        &self,
        function: &str,
        concurrency: u32,
    ) -> Result<(), CollaboratorError> {
        self.aws(["lambda", "put-function-concurrency", "--function-name", function])
            .arg("--reserved-concurrent-executions")
            .arg(concurrency.to_string())
            .run()
            .await?;
        Ok(())
    }

    async fn register_scalable_target(
        &self,
        resource_id: &str,
        policy: &ScalingPolicy,
    ) -> Result<(), CollaboratorError> {
        self.aws(["application-autoscaling", "register-scalable-target"])
            .args(["--service-namespace", "ecs", "--resource-id", resource_id])
            .args(["--scalable-dimension", "ecs:service:DesiredCount"])
            .arg("--min-capacity")
            .arg(policy.min_capacity.to_string())
            .arg("--max-capacity")
            .arg(policy.max_capacity.to_string())
            .run()
            .await?;
        Ok(())
    }

    async fn put_scaling_policy(
        &self,
        resource_id: &str,
        policy: &ScalingPolicy,
    ) -> Result<String, CollaboratorError> {
        let service = resource_id.rsplit('/').next().unwrap_or(resource_id);
        let configuration = json!({
            "TargetValue": f64::from(policy.target_cpu),
            "PredefinedMetricSpecification": {
                "PredefinedMetricType": "ECSServiceAverageCPUUtilization"
            },
            "ScaleOutCooldown": policy.scale_out_cooldown,
            "ScaleInCooldown": policy.scale_in_cooldown,
        });

        let response = self
            .aws(["application-autoscaling", "put-scaling-policy"])
            .args(["--service-namespace", "ecs", "--resource-id", resource_id])
            .args(["--scalable-dimension", "ecs:service:DesiredCount"])
            .arg("--policy-name")
            .arg(format!("{}-scaling-policy", service))
            .args(["--policy-type", "TargetTrackingScaling"])
            .arg("--target-tracking-scaling-policy-configuration")
            .arg(configuration.to_string())
            .run_json()
            .await?;

        Ok(response["PolicyARN"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_datapoint_uses_newest_timestamp() {
        let response = json!({
            "Datapoints": [
                { "Timestamp": "2024-01-01T10:05:00Z", "Average": 40.0 },
                { "Timestamp": "2024-01-01T10:10:00Z", "Average": 75.5 },
                { "Timestamp": "2024-01-01T10:00:00Z", "Average": 10.0 },
            ]
        });
        assert_eq!(latest_datapoint(&response, "Average"), Some(75.5));
        assert_eq!(latest_datapoint(&json!({ "Datapoints": [] }), "Average"), None);
    }

    #[test]
    fn test_split_service_id() {
        assert_eq!(split_service_id("prod/web"), ("prod", "web"));
        assert_eq!(split_service_id("web"), ("default", "web"));
    }

    #[test]
    fn test_distribution_from_response() {
        let response = json!({
            "Distribution": { "Id": "E123", "DomainName": "d1.cloudfront.net", "Status": "Deployed" }
        });
        let dist = distribution_from(&response).unwrap();
        assert_eq!(dist.id, "E123");
        assert_eq!(dist.domain_name, "d1.cloudfront.net");
        assert!(distribution_from(&json!({})).is_err());
    }
}
