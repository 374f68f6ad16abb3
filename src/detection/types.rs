use crate::containerization::DockerfileStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed classification of an uploaded project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    React,
    Vue,
    Angular,
    Nextjs,
    Nuxt,
    Svelte,
    Python,
    Java,
    Go,
    Rust,
    Php,
    Static,
    Unknown,
}

impl ProjectType {
    /// Scoring order; earlier entries win ties
    pub const CATALOG_ORDER: [ProjectType; 12] = [
        ProjectType::React,
        ProjectType::Vue,
        ProjectType::Angular,
        ProjectType::Nextjs,
        ProjectType::Nuxt,
        ProjectType::Svelte,
        ProjectType::Python,
        ProjectType::Java,
        ProjectType::Go,
        ProjectType::Rust,
        ProjectType::Php,
        ProjectType::Static,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::React => "react",
            ProjectType::Vue => "vue",
            ProjectType::Angular => "angular",
            ProjectType::Nextjs => "nextjs",
            ProjectType::Nuxt => "nuxt",
            ProjectType::Svelte => "svelte",
            ProjectType::Python => "python",
            ProjectType::Java => "java",
            ProjectType::Go => "go",
            ProjectType::Rust => "rust",
            ProjectType::Php => "php",
            ProjectType::Static => "static",
            ProjectType::Unknown => "unknown",
        }
    }

    /// JavaScript frameworks built with npm
    pub fn is_frontend(&self) -> bool {
        matches!(
            self,
            ProjectType::React
                | ProjectType::Vue
                | ProjectType::Angular
                | ProjectType::Nextjs
                | ProjectType::Nuxt
                | ProjectType::Svelte
        )
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        ProjectType::CATALOG_ORDER
            .iter()
            .chain(std::iter::once(&ProjectType::Unknown))
            .find(|t| t.as_str() == lowered)
            .copied()
            .ok_or_else(|| format!("unknown project type '{}'", s))
    }
}

/// Facts gathered from the manifests found at the project root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestData {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Dependency names in manifest order
    pub dependencies: Vec<String>,
    pub scripts: BTreeMap<String, String>,
    pub package_manager: Option<String>,
}

impl ManifestData {
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub test: String,
    pub interval: String,
    pub timeout: String,
    pub retries: u32,
}

impl HealthCheck {
    pub fn http(port: u16, path: &str) -> Self {
        Self {
            test: format!("curl -f http://localhost:{}{} || exit 1", port, path),
            interval: "30s".to_string(),
            timeout: "10s".to_string(),
            retries: 3,
        }
    }
}

/// Detection result folded together with the containerization plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProfile {
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub confidence_score: f64,
    pub package_manager: Option<String>,
    pub framework_version: Option<String>,
    pub build_command: Option<String>,
    pub output_dir: Option<String>,
    pub dependencies: Vec<String>,
    pub environment_vars: BTreeMap<String, String>,
    pub port: u16,
    pub base_image: String,
    pub dockerfile_strategy: DockerfileStrategy,
    pub health_check: HealthCheck,
}
