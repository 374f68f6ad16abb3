//! Async wrapper around external command-line tools

use super::CollaboratorError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external tool
#[derive(Debug, Clone)]
pub struct CliCommand {
    program: String,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CliCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            cwd: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg1 arg2 ...`, for logs and manual instructions
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs to completion; a non-zero exit is classified from stderr
    pub async fn run(self) -> Result<CommandOutput, CollaboratorError> {
        debug!(command = %self.display(), "Running external command");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CollaboratorError::Unavailable(format!("{} is not installed", self.program))
            } else {
                CollaboratorError::Failed(format!("failed to start {}: {}", self.program, e))
            }
        })?;

        if let (Some(input), Some(mut pipe)) = (self.stdin.as_deref(), child.stdin.take()) {
            pipe.write_all(input)
                .await
                .map_err(|e| CollaboratorError::Failed(format!("failed to write stdin: {}", e)))?;
        }

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| CollaboratorError::Timeout(limit.as_secs()))?,
            None => wait.await,
        }
        .map_err(|e| CollaboratorError::Failed(format!("{} failed: {}", self.program, e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            let detail = if result.stderr.trim().is_empty() {
                result.stdout.trim().to_string()
            } else {
                result.stderr.trim().to_string()
            };
            Err(CollaboratorError::classify(format!(
                "{} exited with {}: {}",
                self.program, output.status, detail
            )))
        }
    }

    /// Runs and parses stdout as JSON
    pub async fn run_json(self) -> Result<serde_json::Value, CollaboratorError> {
        let program = self.program.clone();
        let output = self.run().await?;
        if output.stdout.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&output.stdout).map_err(|e| {
            CollaboratorError::Failed(format!("{} returned invalid JSON: {}", program, e))
        })
    }
}
