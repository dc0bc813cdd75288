//! Subprocess execution

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::CommandLine;
use crate::error::{ToolError, ToolResult};

/// Captured outcome of one subprocess run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub succeeded: bool,
    pub output: String,
}

impl CommandResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }

    /// Convert into the tool-level result, keeping the output verbatim either way.
    pub fn into_result(self) -> ToolResult<String> {
        if self.succeeded {
            Ok(self.output)
        } else {
            Err(ToolError::CommandFailed(self.output))
        }
    }
}

/// Runs command lines. The seam tests replace with a recording fake.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture output. Never errors: launch failures come back as
    /// a failed [`CommandResult`]. There is no timeout.
    async fn run(&self, command: &CommandLine) -> CommandResult;

    /// Launch without waiting. The child keeps running after the call returns.
    /// Returns the child's process id.
    async fn spawn_detached(&self, command: &CommandLine) -> ToolResult<u32>;
}

/// [`CommandRunner`] backed by real OS processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn build(command: &CommandLine) -> std::process::Command {
        let mut cmd = std::process::Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Classify captured process output.
///
/// Exit zero succeeds with stdout unless stdout is blank and stderr is not. A non-zero
/// exit fails with stderr, or stdout when stderr is empty.
pub fn classify_output(
    program: &str,
    exit_ok: bool,
    status: &str,
    stdout: &str,
    stderr: &str,
) -> CommandResult {
    if exit_ok {
        if stdout.trim().is_empty() && !stderr.trim().is_empty() {
            return CommandResult::failure(stderr);
        }
        return CommandResult::success(stdout);
    }

    if !stderr.trim().is_empty() {
        CommandResult::failure(stderr)
    } else if !stdout.trim().is_empty() {
        CommandResult::failure(stdout)
    } else {
        CommandResult::failure(format!("{} exited with {}", program, status))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> CommandResult {
        tracing::debug!(command = %command, "running");

        let mut cmd = Command::from(Self::build(command));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(program = %command.program, error = %e, "failed to launch");
                return CommandResult::failure(format!(
                    "Failed to execute '{}': {}",
                    command.program, e
                ));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify_output(
            &command.program,
            output.status.success(),
            &output.status.to_string(),
            &stdout,
            &stderr,
        );

        if !result.succeeded {
            tracing::debug!(command = %command, status = %output.status, "command failed");
        }
        result
    }

    async fn spawn_detached(&self, command: &CommandLine) -> ToolResult<u32> {
        tracing::info!(command = %command, "spawning background process");

        let mut std_cmd = Self::build(command);
        // Own process group so the child survives signals aimed at the server.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        let child = cmd.spawn().map_err(|e| {
            ToolError::CommandFailed(format!("Failed to execute '{}': {}", command.program, e))
        })?;

        Ok(child.id().unwrap_or_default())
    }
}
