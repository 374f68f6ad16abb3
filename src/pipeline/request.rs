//! Typed deployment request
//!
//! Every recognized option is a field; unknown keys are rejected at
//! deserialization time.

use crate::detection::ProjectType;
use crate::error::ValidationError;
use crate::kubernetes::ContainerResources;
use crate::scaling::ScalingPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_PROJECT_NAME_LEN: usize = 50;
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[serde(alias = "dev")]
    Development,
    Staging,
    #[default]
    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment '{}' (expected development, staging or production)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStrategy {
    BlueGreen,
    Canary,
    #[default]
    Rolling,
    Recreate,
}

impl fmt::Display for DeploymentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStrategy::BlueGreen => "blue-green",
            DeploymentStrategy::Canary => "canary",
            DeploymentStrategy::Rolling => "rolling",
            DeploymentStrategy::Recreate => "recreate",
        };
        f.write_str(s)
    }
}

/// Container resource limits; unset values keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceSettings {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub storage: Option<String>,
}

impl ResourceSettings {
    pub fn container_resources(&self) -> ContainerResources {
        let mut resources = ContainerResources::default();
        if let Some(cpu) = &self.cpu {
            resources.cpu_limit = cpu.clone();
        }
        if let Some(memory) = &self.memory {
            resources.memory_limit = memory.clone();
        }
        resources
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingSettings {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_cpu: u32,
    pub target_memory: u32,
}

impl Default for ScalingSettings {
    fn default() -> Self {
        Self {
            min_replicas: 1,
            max_replicas: 10,
            target_cpu: 70,
            target_memory: 80,
        }
    }
}

impl ScalingSettings {
    pub fn policy(&self) -> ScalingPolicy {
        ScalingPolicy {
            min_capacity: self.min_replicas,
            max_capacity: self.max_replicas,
            target_cpu: self.target_cpu,
            ..ScalingPolicy::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringSettings {
    pub cloudwatch: bool,
    pub xray: bool,
    pub prometheus: bool,
    pub log_retention_days: u32,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            cloudwatch: true,
            xray: false,
            prometheus: false,
            log_retention_days: 30,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentRequest {
    pub project_name: String,
    /// Expected type; kept with the request and compared against detection
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_true")]
    pub enable_containerization: bool,
    #[serde(default)]
    pub enable_kubernetes: bool,
    #[serde(default = "default_true")]
    pub enable_monitoring: bool,
    #[serde(default)]
    pub enable_auto_scaling: bool,
    #[serde(default)]
    pub deployment_strategy: DeploymentStrategy,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub ssl_certificate: Option<String>,
    #[serde(default)]
    pub resources: Option<ResourceSettings>,
    #[serde(default)]
    pub scaling: ScalingSettings,
    #[serde(default)]
    pub monitoring: MonitoringSettings,
}

impl DeploymentRequest {
    /// Request with every option at its default
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_type: None,
            environment: Environment::default(),
            enable_containerization: true,
            enable_kubernetes: false,
            enable_monitoring: true,
            enable_auto_scaling: false,
            deployment_strategy: DeploymentStrategy::default(),
            region: default_region(),
            domain: None,
            ssl_certificate: None,
            resources: None,
            scaling: ScalingSettings::default(),
            monitoring: MonitoringSettings::default(),
        }
    }

    /// The requested project type, unless it is `unknown`
    pub fn type_hint(&self) -> Option<ProjectType> {
        self.project_type.filter(|t| *t != ProjectType::Unknown)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = &self.project_name;
        if name.is_empty() || name.len() > MAX_PROJECT_NAME_LEN {
            return Err(ValidationError::new(
                "project_name",
                format!("must be 1-{} characters", MAX_PROJECT_NAME_LEN),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::new(
                "project_name",
                "may only contain letters, digits, '-' and '_'",
            ));
        }

        if self.region.trim().is_empty() {
            return Err(ValidationError::new("region", "must not be empty"));
        }
        if matches!(&self.domain, Some(d) if d.trim().is_empty()) {
            return Err(ValidationError::new("domain", "must not be empty when set"));
        }

        let scaling = &self.scaling;
        if scaling.min_replicas == 0 {
            return Err(ValidationError::new("scaling.min_replicas", "must be at least 1"));
        }
        if scaling.min_replicas > scaling.max_replicas {
            return Err(ValidationError::new(
                "scaling",
                format!(
                    "min_replicas ({}) exceeds max_replicas ({})",
                    scaling.min_replicas, scaling.max_replicas
                ),
            ));
        }
        for (field, value) in [
            ("scaling.target_cpu", scaling.target_cpu),
            ("scaling.target_memory", scaling.target_memory),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ValidationError::new(field, "must be between 1 and 100"));
            }
        }

        if self.monitoring.log_retention_days == 0 {
            return Err(ValidationError::new(
                "monitoring.log_retention_days",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
