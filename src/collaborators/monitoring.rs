use super::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    /// Appended to the deployment name: `{name}-{suffix}`
    pub suffix: String,
    pub metric: String,
    pub threshold: f64,
    pub description: String,
}

impl AlarmSpec {
    fn new(suffix: &str, metric: &str, threshold: f64, description: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            metric: metric.to_string(),
            threshold,
            description: description.to_string(),
        }
    }
}

pub fn default_alarms() -> Vec<AlarmSpec> {
    vec![
        AlarmSpec::new("high-cpu", "CPUUtilization", 80.0, "CPU above 80%"),
        AlarmSpec::new("high-memory", "MemoryUtilization", 85.0, "Memory above 85%"),
        AlarmSpec::new("error-rate", "5XXError", 10.0, "More than 10 server errors"),
    ]
}

#[async_trait]
pub trait MonitoringClient: Send + Sync {
    async fn create_log_group(&self, name: &str, retention_days: u32)
        -> Result<(), CollaboratorError>;

    /// Metric stream / dashboard for the deployment; returns its name
    async fn create_metric_stream(&self, name: &str) -> Result<String, CollaboratorError>;

    /// Returns the full alarm names created
    async fn create_alarms(
        &self,
        name: &str,
        alarms: &[AlarmSpec],
    ) -> Result<Vec<String>, CollaboratorError>;

    /// Removes every monitoring construct created for `name`
    async fn delete(&self, name: &str) -> Result<(), CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_alarm_thresholds() {
        let alarms = default_alarms();
        assert_eq!(alarms.len(), 3);
        assert_eq!(alarms[0].suffix, "high-cpu");
        assert_eq!(alarms[0].threshold, 80.0);
        assert_eq!(alarms[1].threshold, 85.0);
    }
}
