//! Node-runner tools: start, stop and inspect a local anvil

use rmcp::model::Tool;
use serde::Deserialize;

use crate::command::CommandLine;
use crate::context::FoundryContext;
use crate::error::ToolResult;
use crate::foundry::{Binary, Toolchain};
use crate::schema::ToolSpec;

#[derive(Debug, Default, Deserialize)]
pub struct AnvilStartArgs {
    pub port: Option<u16>,
    pub host: Option<String>,
    /// URL or `foundry.toml` alias of the chain to fork.
    pub fork_url: Option<String>,
    pub fork_block_number: Option<u64>,
    pub accounts: Option<u32>,
    pub mnemonic: Option<String>,
    pub block_time: Option<u64>,
    pub chain_id: Option<u64>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        ToolSpec::new(
            "anvil_start",
            "Start a local Anvil node as a background process. Supports forking a live chain, \
             a custom port, host, account count, mnemonic, block time and chain id. Use the cast \
             tools with rpc_url=http://localhost:<port> to interact with it.",
        )
        .number("port", "Port to listen on (default: 8545)", false)
        .string("host", "Host address to bind to (default: 127.0.0.1)", false)
        .string(
            "fork_url",
            "RPC URL or foundry.toml rpc_endpoints alias of the chain to fork",
            false,
        )
        .number("fork_block_number", "Block number to fork from", false)
        .number("accounts", "Number of dev accounts to generate (default: 10)", false)
        .string("mnemonic", "BIP39 mnemonic for the dev accounts", false)
        .number("block_time", "Block time in seconds; mines on demand when unset", false)
        .number("chain_id", "Chain id reported by the node", false)
        .build(),
        ToolSpec::new("anvil_stop", "Stop the running Anvil node.").build(),
        ToolSpec::new(
            "anvil_status",
            "Check whether an Anvil node is running, and on which port and RPC URL.",
        )
        .build(),
    ]
}

/// The anvil command line for `args`, with `fork_url` already resolved.
pub fn start_command(toolchain: &Toolchain, args: &AnvilStartArgs, fork_url: Option<&str>) -> CommandLine {
    toolchain
        .command(Binary::Anvil)
        .opt("--port", args.port)
        .opt("--host", args.host.as_deref())
        .opt("--fork-url", fork_url)
        .opt("--fork-block-number", args.fork_block_number)
        .opt("--accounts", args.accounts)
        .opt("--mnemonic", args.mnemonic.as_deref())
        .opt("--block-time", args.block_time)
        .opt("--chain-id", args.chain_id)
}

pub async fn start(ctx: &FoundryContext, args: AnvilStartArgs) -> ToolResult<String> {
    // Only resolve when given: an unset fork_url must not fall back to the default RPC.
    let fork_url = args
        .fork_url
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|alias| ctx.rpc.resolve(Some(alias)));
    let command = start_command(&ctx.toolchain, &args, fork_url.as_deref());
    ctx.node.start(&command).await
}

pub async fn stop(ctx: &FoundryContext) -> ToolResult<String> {
    ctx.node.stop().await
}

pub async fn status(ctx: &FoundryContext) -> ToolResult<String> {
    Ok(ctx.node.status().await?.describe())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::Harness;
    use crate::error::ToolError;
    use crate::executor::tests::FakeRunner;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_start_command_defaults_add_no_flags() {
        let toolchain = Toolchain::from_dir(std::path::Path::new("/opt/foundry/bin"));
        let cmd = start_command(&toolchain, &AnvilStartArgs::default(), None);
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_start_command_with_all_options() {
        let toolchain = Toolchain::default();
        let args = AnvilStartArgs {
            port: Some(9545),
            host: Some("0.0.0.0".into()),
            fork_url: Some("mainnet".into()),
            fork_block_number: Some(19_000_000),
            accounts: Some(3),
            mnemonic: Some("test test test".into()),
            block_time: Some(2),
            chain_id: Some(31337),
        };
        let cmd = start_command(&toolchain, &args, Some("https://eth.example"));

        assert_eq!(cmd.program, "anvil");
        assert_eq!(cmd.flag_value("--port"), Some("9545"));
        assert_eq!(cmd.flag_value("--host"), Some("0.0.0.0"));
        assert_eq!(cmd.flag_value("--fork-url"), Some("https://eth.example"));
        assert_eq!(cmd.flag_value("--fork-block-number"), Some("19000000"));
        assert_eq!(cmd.flag_value("--accounts"), Some("3"));
        assert_eq!(cmd.flag_value("--mnemonic"), Some("test test test"));
        assert_eq!(cmd.flag_value("--block-time"), Some("2"));
        assert_eq!(cmd.flag_value("--chain-id"), Some("31337"));
    }

    #[tokio::test]
    async fn test_start_resolves_fork_alias() {
        let harness = Harness::new(FakeRunner::new());
        std::fs::write(
            harness.ctx.config.workspace.join("foundry.toml"),
            "[rpc_endpoints]\nmainnet = \"https://eth.example\"\n",
        )
        .unwrap();

        let args = AnvilStartArgs {
            fork_url: Some("mainnet".into()),
            ..AnvilStartArgs::default()
        };
        // Nothing shows up in the fake process table, so the start is reported as failed.
        let err = start(&harness.ctx, args).await.unwrap_err();
        assert!(matches!(err, ToolError::NodeStartFailed(_)));

        let spawned = harness.runner.spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].flag_value("--fork-url"), Some("https://eth.example"));
    }

    #[tokio::test]
    async fn test_start_without_fork_does_not_add_default_rpc() {
        let harness = Harness::new(FakeRunner::new());
        let _ = start(&harness.ctx, AnvilStartArgs::default()).await;
        assert!(!harness.runner.spawned()[0].has_flag("--fork-url"));
    }

    #[tokio::test]
    async fn test_status_and_stop_through_context() {
        let harness = Harness::new(FakeRunner::new());
        *harness.registry.running.lock().unwrap() = Some("anvil --port 9000".to_string());

        assert_eq!(
            status(&harness.ctx).await.unwrap(),
            "Anvil is running on port 9000. RPC URL: http://localhost:9000"
        );
        stop(&harness.ctx).await.unwrap();
        assert_eq!(harness.registry.kills.load(Ordering::SeqCst), 1);
        assert_eq!(status(&harness.ctx).await.unwrap(), "Anvil is not running.");
    }

    #[tokio::test]
    async fn test_start_while_running_is_refused() {
        let harness = Harness::new(FakeRunner::new());
        *harness.registry.running.lock().unwrap() = Some("anvil".to_string());

        let err = start(&harness.ctx, AnvilStartArgs::default()).await.unwrap_err();
        assert!(matches!(err, ToolError::NodeAlreadyRunning { .. }));
        assert!(harness.runner.spawned().is_empty());
    }
}
