use super::command::CliCommand;
use super::CollaboratorError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Infrastructure-as-code tool treated as a black box
#[async_trait]
pub trait InfrastructureClient: Send + Sync {
    /// Returns the tool output
    async fn deploy(&self) -> Result<String, CollaboratorError>;

    async fn destroy(&self) -> Result<String, CollaboratorError>;
}

/// Runs `terraform init` then `apply`/`destroy` in a working directory
pub struct TerraformClient {
    workdir: PathBuf,
}

impl TerraformClient {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    async fn run(&self, action: &str) -> Result<String, CollaboratorError> {
        if !self.workdir.is_dir() {
            return Err(CollaboratorError::Unavailable(format!(
                "infrastructure directory {} does not exist",
                self.workdir.display()
            )));
        }

        CliCommand::new("terraform")
            .args(["init", "-input=false"])
            .current_dir(&self.workdir)
            .run()
            .await?;

        info!(action, dir = %self.workdir.display(), "Running terraform");
        let output = CliCommand::new("terraform")
            .args([action, "-auto-approve", "-input=false"])
            .current_dir(&self.workdir)
            .run()
            .await?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl InfrastructureClient for TerraformClient {
    async fn deploy(&self) -> Result<String, CollaboratorError> {
        self.run("apply").await
    }

    async fn destroy(&self) -> Result<String, CollaboratorError> {
        self.run("destroy").await
    }
}
