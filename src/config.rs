//! Configuration management for Foundry MCP Server

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// RPC endpoint used when neither the caller nor the configuration names one.
pub const FALLBACK_RPC_URL: &str = "http://localhost:8545";

const CONFIG_FILE_NAME: &str = ".foundry-mcp-config.json";
const WORKSPACE_DIR_NAME: &str = ".mcp-foundry-workspace";

/// Configuration for the Foundry MCP Server.
///
/// Built once at startup and shared read-only by every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding the forge project that scripts and files live in
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Directory containing forge, cast and anvil (auto-detected when unset)
    #[serde(default)]
    pub foundry_bin: Option<PathBuf>,

    /// Default RPC endpoint for cast and forge script
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Signing key used by state-changing tools when the call does not supply one.
    /// Never written back to disk.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,

    /// How long to wait after launching anvil before checking it came up
    #[serde(default = "default_start_grace_ms")]
    pub node_start_grace_ms: u64,

    /// How long to wait after killing anvil before checking it went away
    #[serde(default = "default_stop_grace_ms")]
    pub node_stop_grace_ms: u64,

    /// Tools hidden from the tool list and refused when called
    #[serde(default)]
    pub disabled_tools: Vec<String>,
}

fn default_workspace() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(WORKSPACE_DIR_NAME)
}

fn default_start_grace_ms() -> u64 {
    2000
}

fn default_stop_grace_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            foundry_bin: None,
            rpc_url: None,
            private_key: None,
            node_start_grace_ms: default_start_grace_ms(),
            node_stop_grace_ms: default_stop_grace_ms(),
            disabled_tools: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file: {}", path_ref.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path_ref.display()))?;

        Ok(config)
    }

    /// Load configuration from `~/.foundry-mcp-config.json`, falling back to
    /// defaults when the file is absent or unparsable.
    pub fn load_default() -> Self {
        if let Some(home) = dirs::home_dir() {
            let default_path = home.join(CONFIG_FILE_NAME);
            if default_path.exists() {
                match Self::from_file(&default_path) {
                    Ok(config) => {
                        tracing::info!(path = %default_path.display(), "loaded config");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %default_path.display(),
                            error = %e,
                            "failed to parse config, using defaults"
                        );
                    }
                }
            }
        }

        tracing::debug!("using default config");
        Self::default()
    }

    /// Overlay `RPC_URL`, `PRIVATE_KEY`, `FOUNDRY_WORKSPACE` and `FOUNDRY_BIN`
    /// from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("RPC_URL") {
            self.rpc_url = Some(url);
        }
        if let Some(key) = lookup("PRIVATE_KEY") {
            self.private_key = Some(key);
        }
        if let Some(dir) = lookup("FOUNDRY_WORKSPACE") {
            self.workspace = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FOUNDRY_BIN") {
            self.foundry_bin = Some(PathBuf::from(dir));
        }
    }

    /// The configured default RPC URL, or [`FALLBACK_RPC_URL`].
    pub fn default_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(FALLBACK_RPC_URL)
    }

    /// Pick the signing key for a state-changing call.
    ///
    /// Explicit argument first, then the configured key, otherwise unsigned.
    /// Blank values count as absent.
    pub fn signing_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.private_key
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
            })
            .map(str::to_string)
    }

    /// Check if a tool is disabled
    pub fn is_tool_disabled(&self, name: &str) -> bool {
        self.disabled_tools.iter().any(|tool| tool == name)
    }

    pub fn node_start_grace(&self) -> Duration {
        Duration::from_millis(self.node_start_grace_ms)
    }

    pub fn node_stop_grace(&self) -> Duration {
        Duration::from_millis(self.node_stop_grace_ms)
    }

    /// Save configuration to a file in JSON format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;

        std::fs::write(path_ref, json)
            .with_context(|| format!("Failed to write config file: {}", path_ref.display()))?;

        Ok(())
    }
}
