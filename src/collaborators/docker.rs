use super::runtime::{ContainerRuntime, ImageBuild, ImageSummary};
use super::CollaboratorError;
use async_trait::async_trait;
use bollard::container::{Config, CreateContainerOptions, StartContainerOptions, StopContainerOptions};
use bollard::image::{BuildImageOptions, ListImagesOptions};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// [`ContainerRuntime`] backed by the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect() -> Result<Self, CollaboratorError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| CollaboratorError::Unavailable(format!("docker: {}", e)))?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

fn map_docker_error(err: bollard::errors::Error) -> CollaboratorError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 401 | 403,
            message,
        } => CollaboratorError::PermissionDenied(message),
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            message,
        } => CollaboratorError::Failed(format!("not found: {}", message)),
        other => CollaboratorError::classify(other.to_string()),
    }
}

/// Tars the build directory in memory
async fn build_context(dir: &Path) -> Result<Vec<u8>, CollaboratorError> {
    let dir: PathBuf = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut archive = tar::Builder::new(Vec::new());
        archive.follow_symlinks(false);
        archive.append_dir_all(".", &dir)?;
        archive.into_inner()
    })
    .await
    .map_err(|e| CollaboratorError::Failed(format!("build context task failed: {}", e)))?
    .map_err(|e| CollaboratorError::Failed(format!("failed to archive build context: {}", e)))
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn build(&self, context: &Path, tag: &str) -> Result<ImageBuild, CollaboratorError> {
        let body = build_context(context).await?;
        debug!(tag, context_bytes = body.len(), "Sending build context to Docker");

        let options = BuildImageOptions {
            dockerfile: "Dockerfile".to_string(),
            t: tag.to_string(),
            rm: true,
            ..Default::default()
        };

        let mut stream = self.docker.build_image(options, None, Some(body.into()));
        let mut log = String::new();
        while let Some(item) = stream.next().await {
            let info = item.map_err(map_docker_error)?;
            if let Some(error) = info.error {
                return Err(CollaboratorError::classify(error));
            }
            if let Some(line) = info.stream {
                log.push_str(&line);
            }
        }

        info!(image = tag, "Container image built");
        Ok(ImageBuild {
            image: tag.to_string(),
            log,
        })
    }

    async fn run(&self, image: &str, port: u16, name: &str) -> Result<String, CollaboratorError> {
        let port_key = format!("{}/tcp", port);
        let config = Config {
            image: Some(image.to_string()),
            exposed_ports: Some(HashMap::from([(port_key.clone(), HashMap::new())])),
            host_config: Some(bollard::service::HostConfig {
                port_bindings: Some(HashMap::from([(
                    port_key,
                    Some(vec![bollard::service::PortBinding {
                        host_ip: Some("0.0.0.0".to_string()),
                        host_port: Some(port.to_string()),
                    }]),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        };

        let container = self
            .docker
            .create_container(
                Some(CreateContainerOptions {
                    name: name.to_string(),
                    ..Default::default()
                }),
                config,
            )
            .await
            .map_err(map_docker_error)?;

        self.docker
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(map_docker_error)?;

        Ok(container.id)
    }

    async fn list(&self) -> Result<Vec<ImageSummary>, CollaboratorError> {
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(map_docker_error)?;

        Ok(images
            .into_iter()
            .flat_map(|image| {
                let created_at = chrono::DateTime::from_timestamp(image.created, 0)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                let size = u64::try_from(image.size).unwrap_or(0);
                image.repo_tags.into_iter().map(move |name| ImageSummary {
                    name,
                    size,
                    created_at: created_at.clone(),
                })
            })
            .collect())
    }

    async fn stop(&self, name: &str) -> Result<(), CollaboratorError> {
        self.docker
            .stop_container(name, Some(StopContainerOptions { t: 10 }))
            .await
            .map_err(map_docker_error)
    }
}
