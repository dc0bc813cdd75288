//! Tool dispatch table

use rmcp::model::Tool;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::context::FoundryContext;
use crate::error::{ToolError, ToolResult};
use crate::{anvil, cast, forge};

type JsonObject = serde_json::Map<String, Value>;

/// A block tag, slot or amount: text or a number, never a boolean.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Text(s) => write!(f, "{}", s),
            Quantity::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A contract call argument, which may also be a boolean.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Arguments of tools that take none.
#[derive(Debug, Default, Deserialize)]
pub struct NoArgs {}

/// Every tool this server can expose.
pub fn all_tools() -> Vec<Tool> {
    let mut tools = anvil::tools();
    tools.extend(cast::tools());
    tools.extend(forge::tools());
    tools
}

/// Tools advertised to clients: everything not disabled by configuration.
pub fn available_tools(ctx: &FoundryContext) -> Vec<Tool> {
    all_tools()
        .into_iter()
        .filter(|tool| !ctx.config.is_tool_disabled(&tool.name))
        .collect()
}

/// Deserialize the call's arguments into the tool's argument record.
pub fn parse_args<T: DeserializeOwned>(arguments: Option<JsonObject>) -> ToolResult<T> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Validate arguments, then refuse disabled tools and a missing toolchain.
fn ready<T: DeserializeOwned>(
    ctx: &FoundryContext,
    name: &str,
    arguments: Option<JsonObject>,
) -> ToolResult<T> {
    let args = parse_args(arguments)?;
    if ctx.config.is_tool_disabled(name) {
        return Err(ToolError::ToolDisabled(name.to_string()));
    }
    if !ctx.toolchain.is_available() {
        return Err(ToolError::ToolchainMissing);
    }
    Ok(args)
}

/// Run the named tool.
pub async fn dispatch(
    ctx: &FoundryContext,
    name: &str,
    arguments: Option<JsonObject>,
) -> ToolResult<String> {
    tracing::info!(tool = name, "tool call");

    match name {
        // Node-runner
        "anvil_start" => anvil::start(ctx, ready(ctx, name, arguments)?).await,
        "anvil_stop" => {
            ready::<NoArgs>(ctx, name, arguments)?;
            anvil::stop(ctx).await
        }
        "anvil_status" => {
            ready::<NoArgs>(ctx, name, arguments)?;
            anvil::status(ctx).await
        }

        // RPC-client
        "cast_call" => cast::call(ctx, ready(ctx, name, arguments)?).await,
        "cast_send" => cast::send(ctx, ready(ctx, name, arguments)?).await,
        "cast_balance" => cast::balance(ctx, ready(ctx, name, arguments)?).await,
        "cast_receipt" => cast::receipt(ctx, ready(ctx, name, arguments)?).await,
        "cast_storage" => cast::storage(ctx, ready(ctx, name, arguments)?).await,
        "cast_run" => cast::run(ctx, ready(ctx, name, arguments)?).await,
        "cast_logs" => cast::logs(ctx, ready(ctx, name, arguments)?).await,
        "cast_sig" => cast::sig(ctx, ready(ctx, name, arguments)?).await,
        "cast_4byte" => cast::four_byte(ctx, ready(ctx, name, arguments)?).await,
        "cast_chain" => cast::chain(ctx, ready(ctx, name, arguments)?).await,
        "convert_eth_units" => cast::convert_units(ctx, ready(ctx, name, arguments)?).await,
        "compute_address" => cast::compute_address(ctx, ready(ctx, name, arguments)?).await,
        "contract_size" => cast::contract_size(ctx, ready(ctx, name, arguments)?).await,
        "estimate_gas" => cast::estimate_gas(ctx, ready(ctx, name, arguments)?).await,

        // Build-framework and workspace
        "forge_script" => forge::script(ctx, ready(ctx, name, arguments)?).await,
        "install_dependency" => forge::install(ctx, ready(ctx, name, arguments)?).await,
        "create_solidity_file" => forge::create_file(ctx, ready(ctx, name, arguments)?).await,
        "read_file" => forge::read_file(ctx, ready(ctx, name, arguments)?).await,
        "list_files" => forge::list_files(ctx, ready(ctx, name, arguments)?).await,

        _ => Err(ToolError::UnknownTool(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::tests::Harness;
    use crate::error::TOOLCHAIN_MISSING_MESSAGE;
    use crate::executor::tests::FakeRunner;
    use crate::executor::CommandResult;
    use serde_json::json;

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    /// Minimal valid arguments for every tool.
    fn sample_calls() -> Vec<(&'static str, Value)> {
        vec![
            ("anvil_start", json!({})),
            ("anvil_stop", json!({})),
            ("anvil_status", json!({})),
            ("cast_call", json!({"contract_address": "0x1", "function_signature": "f()"})),
            ("cast_send", json!({"contract_address": "0x1", "function_signature": "f()"})),
            ("cast_balance", json!({"address": "0x1"})),
            ("cast_receipt", json!({"tx_hash": "0xabc"})),
            ("cast_storage", json!({"address": "0x1", "slot": 0})),
            ("cast_run", json!({"tx_hash": "0xabc"})),
            ("cast_logs", json!({"signature": "Transfer(address,address,uint256)"})),
            ("cast_sig", json!({"function_signature": "f()"})),
            ("cast_4byte", json!({"selector": "0xa9059cbb"})),
            ("cast_chain", json!({})),
            ("convert_eth_units", json!({"value": "1", "from_unit": "ether", "to_unit": "wei"})),
            ("compute_address", json!({"deployer": "0x1"})),
            ("contract_size", json!({"address": "0x1"})),
            ("estimate_gas", json!({"to": "0x1", "function_signature": "f()"})),
            ("forge_script", json!({"script_path": "script/Deploy.s.sol"})),
            ("install_dependency", json!({"dependency": "OpenZeppelin/openzeppelin-contracts"})),
            ("create_solidity_file", json!({"file_path": "src/A.sol", "content": ""})),
            ("read_file", json!({"file_path": "src/A.sol"})),
            ("list_files", json!({})),
        ]
    }

    #[test]
    fn test_every_tool_has_a_sample_call() {
        let names: Vec<String> = all_tools().iter().map(|t| t.name.to_string()).collect();
        let sampled: Vec<&str> = sample_calls().iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), sampled.len());
        for name in &names {
            assert!(sampled.contains(&name.as_str()), "no sample call for {}", name);
        }
    }

    #[tokio::test]
    async fn test_missing_toolchain_short_circuits_every_tool() {
        for (name, value) in sample_calls() {
            let harness = Harness::without_toolchain(FakeRunner::new());
            let err = dispatch(&harness.ctx, name, args(value)).await.unwrap_err();

            assert!(matches!(err, ToolError::ToolchainMissing), "{} returned {:?}", name, err);
            assert_eq!(err.to_string(), TOOLCHAIN_MISSING_MESSAGE);
            assert!(harness.runner.calls().is_empty(), "{} ran a command", name);
            assert!(harness.runner.spawned().is_empty(), "{} spawned a process", name);
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let harness = Harness::new(FakeRunner::new());
        let err = dispatch(&harness.ctx, "cast_wallet", None).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert!(err.is_protocol_error());
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_invalid() {
        let harness = Harness::new(FakeRunner::new());
        let err = dispatch(&harness.ctx, "cast_balance", args(json!({}))).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref m) if m.contains("address")));
        assert!(harness.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_argument_type_is_invalid() {
        let harness = Harness::new(FakeRunner::new());
        let err = dispatch(
            &harness.ctx,
            "anvil_start",
            args(json!({"port": "not-a-number"})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_disabled_tool_is_refused_and_hidden() {
        let config = Config {
            disabled_tools: vec!["cast_send".to_string()],
            ..Config::default()
        };
        let harness = Harness::with_config(FakeRunner::new(), config);

        let err = dispatch(
            &harness.ctx,
            "cast_send",
            args(json!({"contract_address": "0x1", "function_signature": "f()"})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::ToolDisabled(_)));
        assert!(harness.runner.calls().is_empty());

        let listed = available_tools(&harness.ctx);
        assert!(!listed.iter().any(|t| t.name == "cast_send"));
        assert!(listed.iter().any(|t| t.name == "cast_call"));
    }

    /// Balance lookup with no rpc_url and no configured default goes to localhost
    #[tokio::test]
    async fn test_balance_end_to_end_uses_fallback_url() {
        let harness = Harness::new(
            FakeRunner::new().respond(&["balance"], CommandResult::success("1000000000000000000\n")),
        );

        let text = dispatch(
            &harness.ctx,
            "cast_balance",
            args(json!({"address": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"})),
        )
        .await
        .unwrap();

        assert_eq!(
            text,
            "Balance of 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266: 1000000000000000000 wei"
        );
        let calls = harness.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec![
                "balance",
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                "--rpc-url",
                "http://localhost:8545"
            ]
        );
    }

    #[test]
    fn test_quantity_rejects_booleans() {
        assert!(serde_json::from_value::<Quantity>(json!(true)).is_err());
        let slot: Quantity = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(slot.to_string(), "3");
    }

    #[tokio::test]
    async fn test_boolean_amount_is_invalid() {
        let harness = Harness::new(FakeRunner::new());
        let err = dispatch(
            &harness.ctx,
            "convert_eth_units",
            args(json!({"value": true, "from_unit": "ether", "to_unit": "wei"})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(harness.runner.calls().is_empty());
    }

    #[test]
    fn test_scalar_accepts_strings_and_numbers() {
        let text: Scalar = serde_json::from_value(json!("latest")).unwrap();
        let number: Scalar = serde_json::from_value(json!(19000000)).unwrap();
        assert_eq!(text.to_string(), "latest");
        assert_eq!(number.to_string(), "19000000");
    }
}
