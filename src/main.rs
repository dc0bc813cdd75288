//! Foundry MCP Server - Entry point

use anyhow::Result;
use clap::Parser;
use rmcp::service::ServiceExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use foundry_mcp::{config::Config, context::FoundryContext, FoundryMcpHandler};

/// Foundry MCP Server - Model Context Protocol server for forge, cast and anvil
#[derive(Parser, Debug)]
#[command(name = "foundry-mcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Workspace directory for scripts and contracts
    #[arg(long, value_name = "DIR")]
    workspace: Option<PathBuf>,

    /// Directory containing forge, cast and anvil
    #[arg(long, value_name = "DIR")]
    foundry_bin: Option<PathBuf>,

    /// Default RPC URL
    #[arg(long, value_name = "URL")]
    rpc_url: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,
}

impl Cli {
    /// File or default config, then environment, then flags.
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::load_default(),
        };
        config.apply_env();

        if let Some(dir) = &self.workspace {
            config.workspace = dir.clone();
        }
        if let Some(dir) = &self.foundry_bin {
            config.foundry_bin = Some(dir.clone());
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = Some(url.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.load_config()?;

    if let Some(path) = &cli.write_config {
        config.save_to_file(path)?;
        tracing::info!(path = %path.display(), "configuration written");
        return Ok(());
    }

    log_config_status(&config);

    let ctx = FoundryContext::new(config);
    match ctx.toolchain.bin_dir() {
        Some(dir) if ctx.toolchain.is_available() => {
            tracing::info!(dir = %dir.display(), "foundry detected");
        }
        _ => {
            tracing::warn!(
                "foundry binaries not found; searched ~/.foundry/bin, /usr/local/bin, \
                 /opt/homebrew/bin and PATH. Install from https://getfoundry.sh/"
            );
        }
    }

    let handler = FoundryMcpHandler::new(ctx);

    // Serve using stdio transport
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let service = handler.serve((stdin, stdout)).await?;
    service.waiting().await?;

    Ok(())
}

fn log_config_status(config: &Config) {
    tracing::info!(
        workspace = %config.workspace.display(),
        rpc_url = config.default_rpc_url(),
        signing_key = config.private_key.is_some(),
        "configuration loaded"
    );
    if !config.disabled_tools.is_empty() {
        tracing::info!(tools = ?config.disabled_tools, "tools disabled");
    }
}
