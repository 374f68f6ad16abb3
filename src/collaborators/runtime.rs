use super::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuild {
    pub image: String,
    /// Concatenated build output
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub name: String,
    pub size: u64,
    pub created_at: String,
}

/// Local container engine
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Builds `context/Dockerfile` and tags the result as `tag`
    async fn build(&self, context: &Path, tag: &str) -> Result<ImageBuild, CollaboratorError>;

    /// Starts a detached container publishing `port`; returns the container id
    async fn run(&self, image: &str, port: u16, name: &str) -> Result<String, CollaboratorError>;

    async fn list(&self) -> Result<Vec<ImageSummary>, CollaboratorError>;

    async fn stop(&self, name: &str) -> Result<(), CollaboratorError>;
}
