//! Folds a detection result, manifest data and the containerization plan into a profile

use super::detector::Detection;
use super::types::{HealthCheck, ManifestData, ProjectProfile, ProjectType};
use crate::containerization::plan;
use std::collections::BTreeMap;

/// Build command and output directory for a project type
pub fn build_strategy(
    project_type: ProjectType,
    files: &[String],
) -> (Option<String>, Option<String>) {
    let has_root_file = |name: &str| files.iter().any(|f| f == name);

    if project_type.is_frontend() {
        let output = match project_type {
            ProjectType::Nextjs => ".next",
            ProjectType::Nuxt => ".nuxt",
            ProjectType::Svelte => "build",
            _ => "dist",
        };
        return (Some("npm run build".to_string()), Some(output.to_string()));
    }

    match project_type {
        ProjectType::Python if has_root_file("requirements.txt") => {
            (Some("pip install -r requirements.txt".to_string()), None)
        }
        ProjectType::Java if has_root_file("pom.xml") => (
            Some("mvn clean package".to_string()),
            Some("target".to_string()),
        ),
        ProjectType::Java if has_root_file("build.gradle") => (
            Some("./gradlew build".to_string()),
            Some("build".to_string()),
        ),
        ProjectType::Go => (Some("go build -o main .".to_string()), None),
        ProjectType::Rust => (
            Some("cargo build --release".to_string()),
            Some("target/release".to_string()),
        ),
        _ => (None, None),
    }
}

/// Default runtime environment for a project type
pub fn environment_defaults(project_type: ProjectType) -> BTreeMap<String, String> {
    let pairs: &[(&str, &str)] = if project_type.is_frontend() {
        &[("NODE_ENV", "production"), ("PORT", "3000")]
    } else {
        match project_type {
            ProjectType::Python => &[("PYTHONPATH", "/app"), ("PORT", "8000")],
            ProjectType::Java => &[("JAVA_OPTS", "-Xmx512m"), ("PORT", "8080")],
            ProjectType::Go | ProjectType::Rust => &[("PORT", "8080")],
            _ => &[],
        }
    };

    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn health_check(project_type: ProjectType, port: u16) -> HealthCheck {
    match project_type {
        ProjectType::Python => HealthCheck::http(port, "/health"),
        _ => HealthCheck::http(port, "/"),
    }
}

/// Assembles the full profile for a detection result
pub fn build_profile(
    detection: Detection,
    files: &[String],
    manifest: &ManifestData,
) -> ProjectProfile {
    let project_type = detection.project_type;
    let row = plan(project_type);
    let (build_command, output_dir) = build_strategy(project_type, files);

    ProjectProfile {
        project_type,
        confidence_score: detection.confidence,
        package_manager: manifest.package_manager.clone(),
        framework_version: manifest.version.clone(),
        build_command,
        output_dir,
        dependencies: manifest.dependencies.clone(),
        environment_vars: environment_defaults(project_type),
        port: row.port,
        base_image: row.base_image.to_string(),
        dockerfile_strategy: row.strategy,
        health_check: health_check(project_type, row.port),
    }
}
