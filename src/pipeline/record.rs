use super::request::{DeploymentRequest, Environment};
use crate::detection::ProjectProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Detecting,
    Containerizing,
    Building,
    Deploying,
    Configuring,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 8] = [
        DeploymentStatus::Pending,
        DeploymentStatus::Detecting,
        DeploymentStatus::Containerizing,
        DeploymentStatus::Building,
        DeploymentStatus::Deploying,
        DeploymentStatus::Configuring,
        DeploymentStatus::Success,
        DeploymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Detecting => "detecting",
            DeploymentStatus::Containerizing => "containerizing",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Configuring => "configuring",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failed)
    }

    /// Forward through the stage sequence (skipping allowed) or to `failed`
    pub fn can_transition_to(&self, next: DeploymentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == DeploymentStatus::Failed || next.position() > self.position()
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown deployment status '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Artifact,
    ContainerImage,
    Build,
    Kubernetes,
    Storage,
    Cdn,
    Monitoring,
    Scaling,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Artifact => "artifact",
            ResourceKind::ContainerImage => "container image",
            ResourceKind::Build => "build",
            ResourceKind::Kubernetes => "kubernetes",
            ResourceKind::Storage => "storage",
            ResourceKind::Cdn => "cdn",
            ResourceKind::Monitoring => "monitoring",
            ResourceKind::Scaling => "scaling",
        };
        f.write_str(s)
    }
}

/// Something provisioned (or attempted) for a deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
}

impl Resource {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: Uuid,
    pub project_name: String,
    pub status: DeploymentStatus,
    pub progress: u8,
    pub logs: Vec<LogEntry>,
    pub errors: Vec<String>,
    pub resources_created: Vec<Resource>,
    pub resources_failed: Vec<Resource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: DeploymentRequest,
    pub profile: Option<ProjectProfile>,
    /// Image tag built for this deployment
    pub image: Option<String>,
    pub bucket: Option<String>,
    pub distribution_id: Option<String>,
    pub url: Option<String>,
    pub metrics_url: Option<String>,
    pub logs_url: Option<String>,
}

impl DeploymentRecord {
    pub fn new(request: DeploymentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_name: request.project_name.clone(),
            status: DeploymentStatus::Pending,
            progress: 0,
            logs: Vec::new(),
            errors: Vec::new(),
            resources_created: Vec::new(),
            resources_failed: Vec::new(),
            created_at: now,
            updated_at: now,
            options: request,
            profile: None,
            image: None,
            bucket: None,
            distribution_id: None,
            url: None,
            metrics_url: None,
            logs_url: None,
        }
    }

    pub fn environment(&self) -> Environment {
        self.options.environment
    }

    /// First eight characters of the id, used in resource names
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            message: message.into(),
        });
        self.touch();
    }

    /// Applies a forward transition; returns false (and changes nothing) otherwise
    pub fn transition(&mut self, next: DeploymentStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.touch();
        true
    }

    /// Progress never moves backwards while the record is live
    pub fn advance(&mut self, progress: u8) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.min(100));
        self.touch();
    }

    pub fn created(&mut self, resource: Resource) {
        self.resources_created.push(resource);
        self.touch();
    }

    pub fn failed_resource(&mut self, resource: Resource) {
        self.resources_failed.push(resource);
        self.touch();
    }

    /// Terminal failure: progress resets and the error is kept
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        let error = error.into();
        self.status = DeploymentStatus::Failed;
        self.progress = 0;
        self.log(format!("Deployment failed: {}", error));
        self.errors.push(error);
    }

    pub fn succeed(&mut self, base_domain: &str) {
        if !self.transition(DeploymentStatus::Success) {
            return;
        }
        self.progress = 100;
        self.url = Some(format!("https://{}.{}", self.project_name, base_domain));
        self.metrics_url = Some(format!("https://metrics.{}/{}", base_domain, self.id));
        self.logs_url = Some(format!("https://logs.{}/{}", base_domain, self.id));
        self.log("Deployment completed successfully");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RollbackStatus::Pending => "pending",
            RollbackStatus::Running => "running",
            RollbackStatus::Completed => "completed",
            RollbackStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn default_preserve_data() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RollbackRequest {
    #[serde(default)]
    pub target_version: Option<String>,
    #[serde(default)]
    pub force: bool,
    #[serde(default = "default_preserve_data")]
    pub preserve_data: bool,
}

impl Default for RollbackRequest {
    fn default() -> Self {
        Self {
            target_version: None,
            force: false,
            preserve_data: true,
        }
    }
}

/// Tracks one rollback; the deployment it targets is never modified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub id: Uuid,
    pub deployment_id: Uuid,
    pub target_version: Option<String>,
    pub status: RollbackStatus,
    pub options: RollbackRequest,
    pub logs: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RollbackRecord {
    pub fn new(deployment_id: Uuid, options: RollbackRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deployment_id,
            target_version: options.target_version.clone(),
            status: RollbackStatus::Pending,
            options,
            logs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let now = Utc::now();
        self.logs.push(LogEntry {
            timestamp: now,
            message: message.into(),
        });
        self.updated_at = now;
    }

    pub fn set_status(&mut self, status: RollbackStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Equality filters plus offset/limit pagination over insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentFilter {
    pub project_name: Option<String>,
    pub environment: Option<Environment>,
    pub status: Option<DeploymentStatus>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for DeploymentFilter {
    fn default() -> Self {
        Self {
            project_name: None,
            environment: None,
            status: None,
            offset: 0,
            limit: 20,
        }
    }
}

impl DeploymentFilter {
    pub fn matches(&self, record: &DeploymentRecord) -> bool {
        self.project_name
            .as_ref()
            .map_or(true, |name| *name == record.project_name)
            && self
                .environment
                .map_or(true, |env| env == record.environment())
            && self.status.map_or(true, |status| status == record.status)
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<DeploymentRecord>
    where
        I: IntoIterator<Item = &'a DeploymentRecord>,
    {
        records
            .into_iter()
            .filter(|r| self.matches(r))
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> DeploymentRecord {
        DeploymentRecord::new(DeploymentRequest::new(name))
    }

    #[test]
    fn test_transitions_only_move_forward() {
        use DeploymentStatus::*;
        assert!(Pending.can_transition_to(Detecting));
        assert!(Detecting.can_transition_to(Building));
        assert!(Building.can_transition_to(Failed));
        assert!(!Building.can_transition_to(Detecting));
        assert!(!Building.can_transition_to(Building));
        assert!(!Success.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Detecting));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut r = record("demo");
        r.advance(40);
        r.advance(25);
        assert_eq!(r.progress, 40);
        r.advance(250);
        assert_eq!(r.progress, 100);
    }

    #[test]
    fn test_fail_resets_progress_and_freezes() {
        let mut r = record("demo");
        r.transition(DeploymentStatus::Building);
        r.advance(45);
        r.fail("npm exited with 1");

        assert_eq!(r.status, DeploymentStatus::Failed);
        assert_eq!(r.progress, 0);
        assert_eq!(r.errors, vec!["npm exited with 1"]);

        r.advance(60);
        assert!(!r.transition(DeploymentStatus::Deploying));
        assert_eq!(r.progress, 0);
    }

    #[test]
    fn test_succeed_derives_urls() {
        let mut r = record("demo");
        r.transition(DeploymentStatus::Configuring);
        r.succeed("example.dev");

        assert_eq!(r.progress, 100);
        assert_eq!(r.url.as_deref(), Some("https://demo.example.dev"));
        assert_eq!(
            r.metrics_url,
            Some(format!("https://metrics.example.dev/{}", r.id))
        );
        assert_eq!(r.logs_url, Some(format!("https://logs.example.dev/{}", r.id)));
    }

    #[test]
    fn test_short_id() {
        let r = record("demo");
        assert_eq!(r.short_id().len(), 8);
        assert!(r.id.to_string().replace('-', "").starts_with(&r.short_id()));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Deploying".parse::<DeploymentStatus>(),
            Ok(DeploymentStatus::Deploying)
        );
        assert!("done".parse::<DeploymentStatus>().is_err());
    }

    #[test]
    fn test_filter_and_paginate() {
        let mut staging = record("api");
        staging.options.environment = Environment::Staging;
        let records = vec![record("web"), staging, record("web"), record("web")];

        let filter = DeploymentFilter {
            project_name: Some("web".to_string()),
            offset: 1,
            limit: 1,
            ..DeploymentFilter::default()
        };
        let page = filter.apply(&records);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, records[2].id);

        let filter = DeploymentFilter {
            environment: Some(Environment::Staging),
            ..DeploymentFilter::default()
        };
        assert_eq!(filter.apply(&records)[0].project_name, "api");
    }

    #[test]
    fn test_rollback_request_defaults() {
        let request: RollbackRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, RollbackRequest::default());
        assert!(request.preserve_data);
        assert!(serde_json::from_str::<RollbackRequest>(r#"{"restore": true}"#).is_err());
    }
}
