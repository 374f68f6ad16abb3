//! Configuration management for deployhub
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `DEPLOYHUB_PROJECTS_DIR`: Root holding uploaded projects - default: system temp dir + "deployhub-projects"
//! - `DEPLOYHUB_BASE_DOMAIN`: Domain used for deployment URLs - default: "deployhub.com"
//! - `DEPLOYHUB_NAMESPACE`: Kubernetes namespace - default: "default"
//! - `DEPLOYHUB_REGION`: Cloud region - default: "us-east-1"
//! - `DEPLOYHUB_ROLLOUT_TIMEOUT`: Seconds to wait for a rollout - default: "300"
//! - `DEPLOYHUB_BUILD_TIMEOUT`: Seconds a build command may run - default: "900"
//! - `DEPLOYHUB_WRITE_ARTIFACTS`: Write Dockerfile and compose files into the project (true|false) - default: "true"
//! - `DEPLOYHUB_INFRA_DIR`: Terraform working directory - default: "infrastructure"
//! - `DEPLOYHUB_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use deployhub::DeployhubConfig;
//!
//! std::env::set_var("DEPLOYHUB_BASE_DOMAIN", "apps.example.com");
//! let config = DeployhubConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_DOMAIN: &str = "deployhub.com";
const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_ROLLOUT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 900;
const DEFAULT_WRITE_ARTIFACTS: bool = true;
const DEFAULT_INFRA_DIR: &str = "infrastructure";
const DEFAULT_LOG_LEVEL: &str = "info";

const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployhubConfig {
    /// Uploaded projects live at `<projects_dir>/<project_name>`
    pub projects_dir: PathBuf,

    pub base_domain: String,

    pub namespace: String,

    pub region: String,

    pub rollout_timeout_secs: u64,

    pub build_timeout_secs: u64,

    /// Write generated container artifacts into the project tree
    pub write_artifacts: bool,

    pub infrastructure_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

impl Default for DeployhubConfig {
    /// Loads from `DEPLOYHUB_*` variables; unparsable values fall back to defaults
    fn default() -> Self {
        let projects_dir = env::var("DEPLOYHUB_PROJECTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("deployhub-projects"));

        let base_domain =
            env::var("DEPLOYHUB_BASE_DOMAIN").unwrap_or_else(|_| DEFAULT_BASE_DOMAIN.to_string());
        let namespace =
            env::var("DEPLOYHUB_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let region = env::var("DEPLOYHUB_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());

        let rollout_timeout_secs = env::var("DEPLOYHUB_ROLLOUT_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_ROLLOUT_TIMEOUT_SECS);

        let build_timeout_secs = env::var("DEPLOYHUB_BUILD_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_BUILD_TIMEOUT_SECS);

        let write_artifacts = env::var("DEPLOYHUB_WRITE_ARTIFACTS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_WRITE_ARTIFACTS);

        let infrastructure_dir = env::var("DEPLOYHUB_INFRA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_INFRA_DIR));

        let log_level = env::var("DEPLOYHUB_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            projects_dir,
            base_domain,
            namespace,
            region,
            rollout_timeout_secs,
            build_timeout_secs,
            write_artifacts,
            infrastructure_dir,
            log_level,
        }
    }
}

impl DeployhubConfig {
    /// Like `default()`, but a malformed numeric or boolean variable is an error
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = parsed::<u64>("DEPLOYHUB_ROLLOUT_TIMEOUT")? {
            config.rollout_timeout_secs = v;
        }
        if let Some(v) = parsed::<u64>("DEPLOYHUB_BUILD_TIMEOUT")? {
            config.build_timeout_secs = v;
        }
        if let Some(v) = parsed::<bool>("DEPLOYHUB_WRITE_ARTIFACTS")? {
            config.write_artifacts = v;
        }
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for out-of-range timeouts, empty
    /// domain or namespace, and unknown log levels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("Rollout timeout", self.rollout_timeout_secs),
            ("Build timeout", self.build_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be at least 1 second",
                    name
                )));
            }
            if value > MAX_TIMEOUT_SECS {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} cannot exceed 1 hour",
                    name
                )));
            }
        }

        if self.base_domain.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Base domain must not be empty".to_string(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Namespace must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Where the uploaded tree for `project_name` lives
    pub fn project_dir(&self, project_name: &str) -> PathBuf {
        self.projects_dir.join(project_name)
    }

    pub fn rollout_timeout(&self) -> Duration {
        Duration::from_secs(self.rollout_timeout_secs)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            "projects_dir".to_string(),
            self.projects_dir.display().to_string(),
        );
        map.insert("base_domain".to_string(), self.base_domain.clone());
        map.insert("namespace".to_string(), self.namespace.clone());
        map.insert("region".to_string(), self.region.clone());
        map.insert(
            "rollout_timeout_secs".to_string(),
            self.rollout_timeout_secs.to_string(),
        );
        map.insert(
            "build_timeout_secs".to_string(),
            self.build_timeout_secs.to_string(),
        );
        map.insert(
            "write_artifacts".to_string(),
            self.write_artifacts.to_string(),
        );
        map.insert(
            "infrastructure_dir".to_string(),
            self.infrastructure_dir.display().to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map
    }
}

impl fmt::Display for DeployhubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployhub Configuration:")?;
        writeln!(f, "  Projects Dir: {}", self.projects_dir.display())?;
        writeln!(f, "  Base Domain: {}", self.base_domain)?;
        writeln!(f, "  Namespace: {}", self.namespace)?;
        writeln!(f, "  Region: {}", self.region)?;
        writeln!(f, "  Rollout Timeout: {}s", self.rollout_timeout_secs)?;
        writeln!(f, "  Build Timeout: {}s", self.build_timeout_secs)?;
        writeln!(f, "  Write Artifacts: {}", self.write_artifacts)?;
        writeln!(f, "  Infrastructure Dir: {}", self.infrastructure_dir.display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn valid() -> DeployhubConfig {
        DeployhubConfig {
            projects_dir: PathBuf::from("/srv/projects"),
            base_domain: "deployhub.com".to_string(),
            namespace: "default".to_string(),
            region: "us-east-1".to_string(),
            rollout_timeout_secs: 300,
            build_timeout_secs: 900,
            write_artifacts: true,
            infrastructure_dir: PathBuf::from("infrastructure"),
            log_level: "info".to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("DEPLOYHUB_BASE_DOMAIN"),
            EnvGuard::unset("DEPLOYHUB_NAMESPACE"),
            EnvGuard::unset("DEPLOYHUB_ROLLOUT_TIMEOUT"),
            EnvGuard::unset("DEPLOYHUB_WRITE_ARTIFACTS"),
            EnvGuard::unset("DEPLOYHUB_LOG_LEVEL"),
        ];

        let config = DeployhubConfig::default();

        assert_eq!(config.base_domain, DEFAULT_BASE_DOMAIN);
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.rollout_timeout_secs, DEFAULT_ROLLOUT_TIMEOUT_SECS);
        assert!(config.write_artifacts);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("DEPLOYHUB_PROJECTS_DIR", "/data/uploads"),
            EnvGuard::set("DEPLOYHUB_BASE_DOMAIN", "apps.example.com"),
            EnvGuard::set("DEPLOYHUB_ROLLOUT_TIMEOUT", "60"),
            EnvGuard::set("DEPLOYHUB_WRITE_ARTIFACTS", "false"),
            EnvGuard::set("DEPLOYHUB_LOG_LEVEL", "DEBUG"),
        ];

        let config = DeployhubConfig::default();

        assert_eq!(config.project_dir("demo"), PathBuf::from("/data/uploads/demo"));
        assert_eq!(config.base_domain, "apps.example.com");
        assert_eq!(config.rollout_timeout(), Duration::from_secs(60));
        assert!(!config.write_artifacts);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_malformed_numbers() {
        let _guard = EnvGuard::set("DEPLOYHUB_ROLLOUT_TIMEOUT", "five minutes");

        assert_eq!(
            DeployhubConfig::default().rollout_timeout_secs,
            DEFAULT_ROLLOUT_TIMEOUT_SECS
        );
        match DeployhubConfig::from_env().unwrap_err() {
            ConfigError::ParseError { field, .. } => assert_eq!(field, "DEPLOYHUB_ROLLOUT_TIMEOUT"),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_configuration_validation_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_configuration_validation_invalid_timeout() {
        let mut config = valid();
        config.rollout_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.rollout_timeout_secs = 7200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_empty_domain() {
        let mut config = valid();
        config.base_domain = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_log_level() {
        let mut config = valid();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", valid());
        assert!(display.contains("Deployhub Configuration:"));
        assert!(display.contains("Base Domain: deployhub.com"));

        let map = valid().to_display_map();
        assert_eq!(map.get("namespace").map(String::as_str), Some("default"));
    }
}
