use super::strategy::DockerfileStrategy;
use super::templates;
use crate::detection::ProjectProfile;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ContainerizationError {
    #[error("Project type {0} has no exposed port")]
    InvalidPort(String),

    #[error("Strategy {strategy} needs a build output directory")]
    MissingOutputDir { strategy: String },

    #[error("Template for strategy {0} rendered no content")]
    EmptyTemplate(String),

    #[error("Failed to render {artifact}: {message}")]
    Render { artifact: String, message: String },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Rendered container build files for one profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerArtifacts {
    pub dockerfile: String,
    pub compose_dev: String,
    pub compose_prod: String,
    pub dockerignore: String,
    /// Present for nginx-served strategies
    pub nginx_conf: Option<String>,
    pub image_name: String,
    pub port: u16,
    pub base_image: String,
    pub strategy: DockerfileStrategy,
}

impl ContainerArtifacts {
    /// File name and content for every artifact, in write order
    pub fn files(&self) -> Vec<(&'static str, &str)> {
        let mut files = vec![
            ("Dockerfile", self.dockerfile.as_str()),
            ("docker-compose.yml", self.compose_dev.as_str()),
            ("docker-compose.prod.yml", self.compose_prod.as_str()),
            (".dockerignore", self.dockerignore.as_str()),
        ];
        if let Some(conf) = &self.nginx_conf {
            files.push(("nginx.conf", conf.as_str()));
        }
        files
    }

    /// Writes every artifact into `dir`; an existing `nginx.conf` is left alone
    pub async fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, ContainerizationError> {
        let mut written = Vec::new();
        for (name, content) in self.files() {
            let path = dir.join(name);
            if name == "nginx.conf" && tokio::fs::metadata(&path).await.is_ok() {
                debug!(path = %path.display(), "Keeping existing nginx.conf");
                continue;
            }
            tokio::fs::write(&path, content)
                .await
                .map_err(|source| ContainerizationError::Write {
                    path: path.clone(),
                    source,
                })?;
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "Wrote container artifacts");
        Ok(written)
    }
}

fn non_empty(strategy: &DockerfileStrategy, text: String) -> Result<String, ContainerizationError> {
    if text.trim().is_empty() {
        Err(ContainerizationError::EmptyTemplate(strategy.to_string()))
    } else {
        Ok(text)
    }
}

fn render_compose(
    profile: &ProjectProfile,
    production: bool,
) -> Result<String, ContainerizationError> {
    templates::compose(profile, production).map_err(|e| ContainerizationError::Render {
        artifact: if production {
            "docker-compose.prod.yml".to_string()
        } else {
            "docker-compose.yml".to_string()
        },
        message: e.to_string(),
    })
}

/// Renders every container artifact for a profile
///
/// Unrecognized strategies render the generic single-stage Dockerfile.
pub fn build_artifacts(profile: &ProjectProfile) -> Result<ContainerArtifacts, ContainerizationError> {
    let strategy = &profile.dockerfile_strategy;

    if profile.port == 0 {
        return Err(ContainerizationError::InvalidPort(
            profile.project_type.to_string(),
        ));
    }

    let output_dir = match strategy {
        DockerfileStrategy::MultiStageBuild => profile
            .output_dir
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| ContainerizationError::MissingOutputDir {
                strategy: strategy.to_string(),
            })?,
        _ => profile.output_dir.as_deref().unwrap_or(""),
    };

    if strategy.is_custom() {
        debug!(strategy = %strategy, "Unrecognized strategy, using generic template");
    }

    let dockerfile = non_empty(
        strategy,
        templates::render_dockerfile(strategy, profile, output_dir),
    )?;

    let nginx_conf = strategy
        .serves_with_nginx()
        .then(|| templates::nginx_conf(profile.port));

    Ok(ContainerArtifacts {
        dockerfile,
        compose_dev: render_compose(profile, false)?,
        compose_prod: render_compose(profile, true)?,
        dockerignore: templates::dockerignore().to_string(),
        nginx_conf,
        image_name: format!("{}-app:latest", profile.project_type),
        port: profile.port,
        base_image: profile.base_image.clone(),
        strategy: strategy.clone(),
    })
}
