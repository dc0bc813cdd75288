//! RPC-client tools backed by `cast`

use rmcp::model::Tool;
use serde::Deserialize;

use crate::command::CommandLine;
use crate::context::FoundryContext;
use crate::error::{ToolError, ToolResult};
use crate::foundry::{Binary, Toolchain};
use crate::handlers::{Quantity, Scalar};
use crate::schema::ToolSpec;

const RPC_URL_DESC: &str =
    "RPC URL or foundry.toml rpc_endpoints alias (defaults to the configured RPC URL)";
const BLOCK_DESC: &str = "Block number or tag (latest, pending, earliest)";
const ARGS_DESC: &str = "Function arguments, one element per argument";

fn text(values: &[Scalar]) -> Vec<String> {
    values.iter().map(Scalar::to_string).collect()
}

fn trimmed(output: String) -> String {
    output.trim().to_string()
}

#[derive(Debug, Deserialize)]
pub struct CallArgs {
    pub contract_address: String,
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<Scalar>,
    pub block: Option<Quantity>,
    pub from: Option<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendArgs {
    pub contract_address: String,
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<Scalar>,
    pub value: Option<Quantity>,
    pub gas_limit: Option<Quantity>,
    pub gas_price: Option<Quantity>,
    pub private_key: Option<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceArgs {
    pub address: String,
    pub block: Option<Quantity>,
    #[serde(default)]
    pub ether: bool,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptArgs {
    pub tx_hash: String,
    pub field: Option<String>,
    pub confirmations: Option<u64>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StorageArgs {
    pub address: String,
    pub slot: Quantity,
    pub block: Option<Quantity>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunArgs {
    pub tx_hash: String,
    #[serde(default)]
    pub quick: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogsArgs {
    pub signature: String,
    pub from_block: Option<Quantity>,
    pub to_block: Option<Quantity>,
    pub address: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SigArgs {
    pub function_signature: String,
}

#[derive(Debug, Deserialize)]
pub struct FourByteArgs {
    pub selector: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChainArgs {
    #[serde(default)]
    pub return_id: bool,
    pub rpc_url: Option<String>,
}

/// Denominations accepted by `convert_eth_units`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthUnit {
    Wei,
    Gwei,
    Ether,
}

impl EthUnit {
    pub const NAMES: [&'static str; 3] = ["wei", "gwei", "ether"];

    pub fn name(self) -> &'static str {
        match self {
            EthUnit::Wei => "wei",
            EthUnit::Gwei => "gwei",
            EthUnit::Ether => "ether",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConvertArgs {
    pub value: Quantity,
    pub from_unit: EthUnit,
    pub to_unit: EthUnit,
}

#[derive(Debug, Deserialize)]
pub struct ComputeAddressArgs {
    pub deployer: String,
    pub nonce: Option<u64>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContractSizeArgs {
    pub address: String,
    pub block: Option<Quantity>,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateGasArgs {
    pub to: String,
    pub function_signature: String,
    #[serde(default)]
    pub args: Vec<Scalar>,
    pub value: Option<Quantity>,
    pub from: Option<String>,
    pub rpc_url: Option<String>,
}

pub fn tools() -> Vec<Tool> {
    vec![
        ToolSpec::new(
            "cast_call",
            "Call a contract function without publishing a transaction (read-only).",
        )
        .string("contract_address", "Address of the contract", true)
        .string(
            "function_signature",
            "Function signature, e.g. balanceOf(address)(uint256)",
            true,
        )
        .string_array("args", ARGS_DESC)
        .string("block", BLOCK_DESC, false)
        .string("from", "Address to call from", false)
        .string("rpc_url", RPC_URL_DESC, false)
        .build(),
        ToolSpec::new(
            "cast_send",
            "Sign and publish a transaction to a contract. Uses the private_key argument, \
             otherwise the configured key; without either the transaction is sent unsigned \
             (works against an unlocked node such as anvil).",
        )
        .string("contract_address", "Address of the contract", true)
        .string(
            "function_signature",
            "Function signature, e.g. transfer(address,uint256)",
            true,
        )
        .string_array("args", ARGS_DESC)
        .string("value", "Ether to send with the transaction, e.g. 0.1ether", false)
        .string("gas_limit", "Gas limit for the transaction", false)
        .string("gas_price", "Gas price for the transaction", false)
        .string("private_key", "Private key to sign with", false)
        .string("rpc_url", RPC_URL_DESC, false)
        .build(),
        ToolSpec::new("cast_balance", "Get the ether balance of an account.")
            .string("address", "Account address or ENS name", true)
            .string("block", BLOCK_DESC, false)
            .boolean("ether", "Report the balance in ether instead of wei")
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new("cast_receipt", "Get the receipt of a transaction.")
            .string("tx_hash", "Transaction hash", true)
            .string("field", "Only return this receipt field, e.g. status or gasUsed", false)
            .number("confirmations", "Wait for this many confirmations", false)
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new("cast_storage", "Read a raw storage slot of a contract.")
            .string("address", "Address of the contract", true)
            .string("slot", "Storage slot number or hex key", true)
            .string("block", BLOCK_DESC, false)
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new(
            "cast_run",
            "Replay a published transaction in a local environment and print its trace.",
        )
        .string("tx_hash", "Transaction hash", true)
        .boolean(
            "quick",
            "Execute the transaction only, skipping the earlier transactions in its block",
        )
        .string_array("labels", "Address labels in the form <address>:<label>")
        .string("rpc_url", RPC_URL_DESC, false)
        .build(),
        ToolSpec::new("cast_logs", "Get event logs matching an event signature or topic.")
            .string(
                "signature",
                "Event signature, e.g. Transfer(address,address,uint256), or topic 0",
                true,
            )
            .string("from_block", "First block to search", false)
            .string("to_block", "Last block to search", false)
            .string("address", "Only logs emitted by this contract", false)
            .string_array("topics", "Additional indexed topics to filter on")
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new("cast_sig", "Get the 4-byte selector of a function signature.")
            .string(
                "function_signature",
                "Function signature, e.g. transfer(address,uint256)",
                true,
            )
            .build(),
        ToolSpec::new(
            "cast_4byte",
            "Look up the function signatures that match a 4-byte selector.",
        )
        .string("selector", "Selector, e.g. 0xa9059cbb", true)
        .build(),
        ToolSpec::new("cast_chain", "Get the name or id of the connected chain.")
            .boolean("return_id", "Return the numeric chain id instead of the name")
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new("convert_eth_units", "Convert an amount between wei, gwei and ether.")
            .string("value", "Amount to convert", true)
            .enumeration("from_unit", "Unit of the amount", &EthUnit::NAMES, true)
            .enumeration("to_unit", "Unit to convert to", &EthUnit::NAMES, true)
            .build(),
        ToolSpec::new(
            "compute_address",
            "Compute the address a contract deployed by an account will have.",
        )
        .string("deployer", "Deployer address", true)
        .number("nonce", "Deployer nonce (defaults to its current nonce)", false)
        .string("rpc_url", RPC_URL_DESC, false)
        .build(),
        ToolSpec::new("contract_size", "Get the runtime bytecode size of a contract in bytes.")
            .string("address", "Address of the contract", true)
            .string("block", BLOCK_DESC, false)
            .string("rpc_url", RPC_URL_DESC, false)
            .build(),
        ToolSpec::new(
            "estimate_gas",
            "Estimate the gas a contract call would use and what it would cost at the current \
             gas price.",
        )
        .string("to", "Address of the contract", true)
        .string(
            "function_signature",
            "Function signature, e.g. transfer(address,uint256)",
            true,
        )
        .string_array("args", ARGS_DESC)
        .string("value", "Ether sent with the call, e.g. 0.1ether", false)
        .string("from", "Address to estimate from", false)
        .string("rpc_url", RPC_URL_DESC, false)
        .build(),
    ]
}

// Command builders

pub fn call_command(toolchain: &Toolchain, args: &CallArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("call")
        .arg(&args.contract_address)
        .arg(&args.function_signature)
        .args(text(&args.args))
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", args.block.as_ref())
        .opt("--from", args.from.as_deref())
}

pub fn send_command(
    toolchain: &Toolchain,
    args: &SendArgs,
    rpc_url: &str,
    private_key: Option<&str>,
) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("send")
        .arg(&args.contract_address)
        .arg(&args.function_signature)
        .args(text(&args.args))
        .opt("--rpc-url", Some(rpc_url))
        .opt("--private-key", private_key)
        .opt("--value", args.value.as_ref())
        .opt("--gas-limit", args.gas_limit.as_ref())
        .opt("--gas-price", args.gas_price.as_ref())
}

pub fn balance_command(toolchain: &Toolchain, args: &BalanceArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("balance")
        .arg(&args.address)
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", args.block.as_ref())
        .flag("--ether", args.ether)
}

pub fn receipt_command(toolchain: &Toolchain, args: &ReceiptArgs, rpc_url: &str) -> CommandLine {
    let mut cmd = toolchain.command(Binary::Cast).arg("receipt").arg(&args.tx_hash);
    if let Some(field) = args.field.as_deref().filter(|f| !f.trim().is_empty()) {
        cmd = cmd.arg(field);
    }
    cmd.opt("--rpc-url", Some(rpc_url))
        .opt("--confirmations", args.confirmations)
}

pub fn storage_command(toolchain: &Toolchain, args: &StorageArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("storage")
        .arg(&args.address)
        .arg(args.slot.to_string())
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", args.block.as_ref())
}

pub fn run_command(toolchain: &Toolchain, args: &RunArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("run")
        .arg(&args.tx_hash)
        .opt("--rpc-url", Some(rpc_url))
        .flag("--quick", args.quick)
        .opt_each("--label", args.labels.iter().cloned())
}

pub fn logs_command(toolchain: &Toolchain, args: &LogsArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("logs")
        .opt("--from-block", args.from_block.as_ref())
        .opt("--to-block", args.to_block.as_ref())
        .opt("--address", args.address.as_deref())
        .arg(&args.signature)
        .args(args.topics.iter().cloned())
        .opt("--rpc-url", Some(rpc_url))
}

pub fn chain_command(toolchain: &Toolchain, args: &ChainArgs, rpc_url: &str) -> CommandLine {
    let subcommand = if args.return_id { "chain-id" } else { "chain" };
    toolchain
        .command(Binary::Cast)
        .arg(subcommand)
        .opt("--rpc-url", Some(rpc_url))
}

/// `cast to-unit 1.5ether wei`: the source unit is suffixed onto the amount.
pub fn convert_command(toolchain: &Toolchain, args: &ConvertArgs) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("to-unit")
        .arg(format!("{}{}", args.value, args.from_unit.name()))
        .arg(args.to_unit.name())
}

pub fn compute_address_command(
    toolchain: &Toolchain,
    args: &ComputeAddressArgs,
    rpc_url: &str,
) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("compute-address")
        .arg(&args.deployer)
        .opt("--nonce", args.nonce)
        .opt("--rpc-url", Some(rpc_url))
}

pub fn contract_size_command(
    toolchain: &Toolchain,
    args: &ContractSizeArgs,
    rpc_url: &str,
) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("codesize")
        .arg(&args.address)
        .opt("--rpc-url", Some(rpc_url))
        .opt("--block", args.block.as_ref())
}

pub fn estimate_command(toolchain: &Toolchain, args: &EstimateGasArgs, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("estimate")
        .arg(&args.to)
        .arg(&args.function_signature)
        .args(text(&args.args))
        .opt("--rpc-url", Some(rpc_url))
        .opt("--value", args.value.as_ref())
        .opt("--from", args.from.as_deref())
}

pub fn gas_price_command(toolchain: &Toolchain, rpc_url: &str) -> CommandLine {
    toolchain
        .command(Binary::Cast)
        .arg("gas-price")
        .opt("--rpc-url", Some(rpc_url))
}

// Handlers

pub async fn call(ctx: &FoundryContext, args: CallArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&call_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn send(ctx: &FoundryContext, args: SendArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    let key = ctx.config.signing_key(args.private_key.as_deref());
    if key.is_none() {
        tracing::debug!("no signing key configured, sending unsigned");
    }
    ctx.run(&send_command(&ctx.toolchain, &args, &rpc_url, key.as_deref()))
        .await
        .map(trimmed)
}

pub async fn balance(ctx: &FoundryContext, args: BalanceArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    let output = ctx
        .run(&balance_command(&ctx.toolchain, &args, &rpc_url))
        .await?;
    let unit = if args.ether { "ETH" } else { "wei" };
    Ok(format!("Balance of {}: {} {}", args.address, output.trim(), unit))
}

pub async fn receipt(ctx: &FoundryContext, args: ReceiptArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&receipt_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn storage(ctx: &FoundryContext, args: StorageArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&storage_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn run(ctx: &FoundryContext, args: RunArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&run_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn logs(ctx: &FoundryContext, args: LogsArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&logs_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn sig(ctx: &FoundryContext, args: SigArgs) -> ToolResult<String> {
    let cmd = ctx
        .toolchain
        .command(Binary::Cast)
        .arg("sig")
        .arg(&args.function_signature);
    ctx.run(&cmd).await.map(trimmed)
}

pub async fn four_byte(ctx: &FoundryContext, args: FourByteArgs) -> ToolResult<String> {
    let cmd = ctx
        .toolchain
        .command(Binary::Cast)
        .arg("4byte")
        .arg(&args.selector);
    ctx.run(&cmd).await.map(trimmed)
}

pub async fn chain(ctx: &FoundryContext, args: ChainArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&chain_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn convert_units(ctx: &FoundryContext, args: ConvertArgs) -> ToolResult<String> {
    let output = ctx.run(&convert_command(&ctx.toolchain, &args)).await?;
    Ok(format!(
        "{} {} = {} {}",
        args.value,
        args.from_unit.name(),
        output.trim(),
        args.to_unit.name()
    ))
}

pub async fn compute_address(ctx: &FoundryContext, args: ComputeAddressArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    ctx.run(&compute_address_command(&ctx.toolchain, &args, &rpc_url))
        .await
        .map(trimmed)
}

pub async fn contract_size(ctx: &FoundryContext, args: ContractSizeArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    let output = ctx
        .run(&contract_size_command(&ctx.toolchain, &args, &rpc_url))
        .await?;
    Ok(format!(
        "Contract size of {}: {} bytes",
        args.address,
        output.trim()
    ))
}

pub async fn estimate_gas(ctx: &FoundryContext, args: EstimateGasArgs) -> ToolResult<String> {
    let rpc_url = ctx.rpc.resolve(args.rpc_url.as_deref());
    let gas = ctx
        .run(&estimate_command(&ctx.toolchain, &args, &rpc_url))
        .await?;
    let price = ctx.run(&gas_price_command(&ctx.toolchain, &rpc_url)).await?;
    GasEstimate::parse(&gas, &price).map(|estimate| estimate.describe())
}

/// Gas units from `cast estimate` priced with `cast gas-price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas: u128,
    pub gas_price_wei: u128,
}

impl GasEstimate {
    pub fn parse(gas: &str, gas_price: &str) -> ToolResult<Self> {
        let number = |label: &str, raw: &str| {
            raw.trim().parse::<u128>().map_err(|_| {
                ToolError::CommandFailed(format!("unexpected {} output: {}", label, raw.trim()))
            })
        };
        Ok(Self {
            gas: number("gas estimate", gas)?,
            gas_price_wei: number("gas price", gas_price)?,
        })
    }

    pub fn cost_wei(&self) -> Option<u128> {
        self.gas.checked_mul(self.gas_price_wei)
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "Estimated gas: {} units\nGas price: {} wei ({} gwei)",
            self.gas,
            self.gas_price_wei,
            format_units(self.gas_price_wei, 9)
        );
        match self.cost_wei() {
            Some(cost) => out.push_str(&format!(
                "\nEstimated cost: {} wei ({} ETH)",
                cost,
                format_units(cost, 18)
            )),
            None => out.push_str("\nEstimated cost: too large to compute"),
        }
        out
    }
}

/// Render an integer amount with `decimals` fractional digits, dropping trailing zeros.
pub fn format_units(amount: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
