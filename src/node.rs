//! Background Anvil node tracking
//!
//! There is no handle to the node process: liveness is read from the OS process table
//! on every query. Name matching can see an anvil this server did not start, and the
//! fixed grace periods after start/stop are not readiness checks. Two concurrent starts
//! can both pass the running check before either process shows up.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use crate::command::CommandLine;
use crate::config::Config;
use crate::error::{ToolError, ToolResult};
use crate::executor::CommandRunner;

pub const DEFAULT_NODE_PORT: &str = "8545";
const NODE_PROCESS: &str = "anvil";

static PORT_FLAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:--port|-p)(?:=|\s+)(\d+)").expect("port pattern is valid")
});

/// Extract the listening port from a node command line, defaulting to 8545.
pub fn parse_port(command_line: &str) -> String {
    PORT_FLAG
        .captures(command_line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_NODE_PORT.to_string())
}

/// Snapshot of the node's state at the moment it was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub running: bool,
    pub port: Option<String>,
    pub url: Option<String>,
}

impl NodeStatus {
    pub fn stopped() -> Self {
        Self {
            running: false,
            port: None,
            url: None,
        }
    }

    pub fn from_command_line(command_line: Option<&str>) -> Self {
        match command_line {
            Some(cmd) => {
                let port = parse_port(cmd);
                Self {
                    running: true,
                    url: Some(format!("http://localhost:{}", port)),
                    port: Some(port),
                }
            }
            None => Self::stopped(),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.port, &self.url) {
            (Some(port), Some(url)) if self.running => {
                format!("Anvil is running on port {}. RPC URL: {}", port, url)
            }
            _ => "Anvil is not running.".to_string(),
        }
    }
}

/// Looks up and kills processes by name.
#[async_trait]
pub trait ProcessRegistry: Send + Sync {
    /// Command line of a running process whose executable is named `name`.
    async fn find(&self, name: &str) -> ToolResult<Option<String>>;

    /// Ask the OS to kill every process named `name`.
    async fn kill(&self, name: &str) -> ToolResult<()>;
}

/// Find the first process-table line whose executable basename is `name`.
pub fn find_in_process_list<'a>(listing: &'a str, name: &str) -> Option<&'a str> {
    listing.lines().map(str::trim).find(|line| {
        line.split_whitespace()
            .next()
            .and_then(|exe| exe.rsplit(['/', '\\']).next())
            .map(|base| base == name || base.strip_suffix(".exe") == Some(name))
            .unwrap_or(false)
    })
}

/// [`ProcessRegistry`] that shells out to `ps`/`pkill`, or `tasklist`/`taskkill` on Windows.
#[derive(Debug, Clone, Default)]
pub struct PsRegistry;

impl PsRegistry {
    async fn capture(program: &str, args: &[&str]) -> ToolResult<std::process::Output> {
        Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| ToolError::CommandFailed(format!("Failed to execute '{}': {}", program, e)))
    }
}

#[async_trait]
impl ProcessRegistry for PsRegistry {
    #[cfg(not(windows))]
    async fn find(&self, name: &str) -> ToolResult<Option<String>> {
        let output = Self::capture("ps", &["-A", "-o", "args="]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(find_in_process_list(&listing, name).map(str::to_string))
    }

    #[cfg(windows)]
    async fn find(&self, name: &str) -> ToolResult<Option<String>> {
        // tasklist does not expose arguments, so the port falls back to the default.
        let filter = format!("IMAGENAME eq {}.exe", name);
        let output = Self::capture("tasklist", &["/FI", &filter, "/NH"]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(find_in_process_list(&listing, name).map(str::to_string))
    }

    #[cfg(not(windows))]
    async fn kill(&self, name: &str) -> ToolResult<()> {
        let output = Self::capture("pkill", &["-x", name]).await?;
        if !output.status.success() {
            tracing::warn!(process = name, status = %output.status, "pkill matched nothing");
        }
        Ok(())
    }

    #[cfg(windows)]
    async fn kill(&self, name: &str) -> ToolResult<()> {
        let image = format!("{}.exe", name);
        let output = Self::capture("taskkill", &["/F", "/IM", &image]).await?;
        if !output.status.success() {
            tracing::warn!(process = name, status = %output.status, "taskkill failed");
        }
        Ok(())
    }
}

/// Starts, stops and reports on the background anvil node.
#[derive(Clone)]
pub struct NodeMonitor {
    registry: Arc<dyn ProcessRegistry>,
    runner: Arc<dyn CommandRunner>,
    start_grace: Duration,
    stop_grace: Duration,
}

impl NodeMonitor {
    pub fn new(
        config: &Config,
        registry: Arc<dyn ProcessRegistry>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            registry,
            runner,
            start_grace: config.node_start_grace(),
            stop_grace: config.node_stop_grace(),
        }
    }

    pub async fn status(&self) -> ToolResult<NodeStatus> {
        let found = self.registry.find(NODE_PROCESS).await?;
        Ok(NodeStatus::from_command_line(found.as_deref()))
    }

    /// Launch `command` in the background unless a node is already running.
    pub async fn start(&self, command: &CommandLine) -> ToolResult<String> {
        let before = self.status().await?;
        if before.running {
            return Err(ToolError::NodeAlreadyRunning {
                port: before.port.unwrap_or_else(|| DEFAULT_NODE_PORT.to_string()),
            });
        }

        let pid = self.runner.spawn_detached(command).await?;
        tokio::time::sleep(self.start_grace).await;

        let after = self.status().await?;
        if !after.running {
            return Err(ToolError::NodeStartFailed(format!(
                "no anvil process found {}ms after launching '{}'",
                self.start_grace.as_millis(),
                command
            )));
        }

        tracing::info!(pid, port = ?after.port, "anvil started");
        Ok(format!(
            "Anvil started successfully on port {}. RPC URL: {}\nProcess ID: {}",
            after.port.as_deref().unwrap_or(DEFAULT_NODE_PORT),
            after.url.as_deref().unwrap_or_default(),
            pid
        ))
    }

    /// Kill the running node. Refuses without side effects when none is running.
    pub async fn stop(&self) -> ToolResult<String> {
        if !self.status().await?.running {
            return Err(ToolError::NodeNotRunning);
        }

        self.registry.kill(NODE_PROCESS).await?;
        tokio::time::sleep(self.stop_grace).await;

        if self.status().await?.running {
            return Err(ToolError::NodeStillRunning);
        }

        tracing::info!("anvil stopped");
        Ok("Anvil has been stopped successfully.".to_string())
    }
}
