use super::command::CliCommand;
use super::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub output: String,
    pub duration_ms: u64,
}

/// Runs a project's build command in its working tree
#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn run(&self, command: &str, workdir: &Path) -> Result<BuildOutcome, CollaboratorError>;
}

/// Executes build commands through `sh -c`
pub struct ShellBuildRunner {
    timeout: Duration,
}

impl ShellBuildRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl BuildRunner for ShellBuildRunner {
    async fn run(&self, command: &str, workdir: &Path) -> Result<BuildOutcome, CollaboratorError> {
        let start = Instant::now();
        let output = CliCommand::new("sh")
            .args(["-c", command])
            .current_dir(workdir)
            .timeout(self.timeout)
            .run()
            .await?;

        Ok(BuildOutcome {
            output: output.stdout,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_runs_in_workdir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let runner = ShellBuildRunner::new(Duration::from_secs(10));
        let outcome = runner.run("ls", dir.path()).await.unwrap();
        assert!(outcome.output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_failing_command_is_error() {
        let dir = TempDir::new().unwrap();
        let runner = ShellBuildRunner::new(Duration::from_secs(10));
        let err = runner.run("exit 2", dir.path()).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Failed(_)));
    }
}
