//! RPC endpoint resolution
//!
//! Callers may pass a full URL, an alias defined under `[rpc_endpoints]` in the
//! workspace `foundry.toml`, or nothing at all.

use std::path::{Path, PathBuf};

use crate::config::Config;

const URL_SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

/// Whether `value` already carries a recognized URL scheme.
pub fn is_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    URL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// Turns an optional URL-or-alias into a concrete endpoint. Recomputed per call.
#[derive(Debug, Clone)]
pub struct RpcResolver {
    default_url: String,
    foundry_toml: PathBuf,
}

impl RpcResolver {
    pub fn new(config: &Config) -> Self {
        Self::with_config_file(
            config.default_rpc_url(),
            config.workspace.join("foundry.toml"),
        )
    }

    pub fn with_config_file(default_url: impl Into<String>, foundry_toml: impl Into<PathBuf>) -> Self {
        Self {
            default_url: default_url.into(),
            foundry_toml: foundry_toml.into(),
        }
    }

    /// Resolve in order: explicit URL, alias from `foundry.toml`, configured default.
    ///
    /// An alias that cannot be resolved, for any reason, is returned unchanged.
    pub fn resolve(&self, input: Option<&str>) -> String {
        let Some(input) = input.map(str::trim).filter(|s| !s.is_empty()) else {
            return self.default_url.clone();
        };

        if is_url(input) {
            return input.to_string();
        }

        match lookup_alias(&self.foundry_toml, input) {
            Some(url) => {
                tracing::debug!(alias = input, url = %url, "resolved rpc alias");
                url
            }
            None => input.to_string(),
        }
    }
}

fn lookup_alias(path: &Path, alias: &str) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no foundry.toml for alias lookup");
            return None;
        }
    };
    alias_from_toml(&content, alias)
}

/// Find `alias` under `[rpc_endpoints]`, or `[profile.default.rpc_endpoints]`.
fn alias_from_toml(content: &str, alias: &str) -> Option<String> {
    let table: toml::Table = match toml::from_str(content) {
        Ok(table) => table,
        Err(e) => {
            tracing::debug!(error = %e, "foundry.toml did not parse");
            return None;
        }
    };

    let profile_endpoints = table
        .get("profile")
        .and_then(|p| p.get("default"))
        .and_then(|d| d.get("rpc_endpoints"));

    table
        .get("rpc_endpoints")
        .and_then(|t| t.get(alias))
        .or_else(|| profile_endpoints.and_then(|t| t.get(alias)))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
