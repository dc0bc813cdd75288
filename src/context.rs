//! Shared state handed to every tool call

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::command::CommandLine;
use crate::config::Config;
use crate::error::ToolResult;
use crate::executor::{CommandRunner, ProcessRunner};
use crate::foundry::Toolchain;
use crate::node::{NodeMonitor, ProcessRegistry, PsRegistry};
use crate::rpc::RpcResolver;
use crate::workspace::Workspace;

/// Everything a tool needs, built once at startup from the [`Config`].
pub struct FoundryContext {
    pub config: Config,
    pub toolchain: Toolchain,
    pub runner: Arc<dyn CommandRunner>,
    pub rpc: RpcResolver,
    pub node: NodeMonitor,
    pub workspace: Workspace,
}

impl FoundryContext {
    /// Context backed by real processes and the detected toolchain.
    pub fn new(config: Config) -> Self {
        let toolchain = Toolchain::detect(&config);
        Self::with_parts(
            config,
            toolchain,
            Arc::new(ProcessRunner),
            Arc::new(PsRegistry),
        )
    }

    pub fn with_parts(
        config: Config,
        toolchain: Toolchain,
        runner: Arc<dyn CommandRunner>,
        registry: Arc<dyn ProcessRegistry>,
    ) -> Self {
        let rpc = RpcResolver::new(&config);
        let node = NodeMonitor::new(&config, registry, Arc::clone(&runner));
        let workspace = Workspace::new(config.workspace.clone());
        Self {
            config,
            toolchain,
            runner,
            rpc,
            node,
            workspace,
        }
    }

    /// Run a command to completion; failures carry the command's output.
    pub async fn run(&self, command: &CommandLine) -> ToolResult<String> {
        self.runner.run(command).await.into_result()
    }

    /// The workspace root, initializing the forge project on first use.
    pub async fn workspace_root(&self) -> ToolResult<PathBuf> {
        self.workspace
            .ensure(&self.toolchain, self.runner.as_ref())
            .await
            .map(Path::to_path_buf)
    }
}
