//! MCP server handler implementation

use rmcp::{
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData as McpError, ServerHandler,
};
use std::sync::Arc;

use crate::context::FoundryContext;
use crate::handlers;

/// MCP server handler
#[derive(Clone)]
pub struct FoundryMcpHandler {
    ctx: Arc<FoundryContext>,
}

impl FoundryMcpHandler {
    pub fn new(ctx: FoundryContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Tools currently offered to clients.
    pub fn tools(&self) -> Vec<Tool> {
        handlers::available_tools(&self.ctx)
    }

    /// Run a tool and shape its outcome for the wire.
    ///
    /// Bad arguments and unknown tools are protocol errors; every other failure is an
    /// error tool result so the session keeps going.
    pub async fn handle_call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        match handlers::dispatch(&self.ctx, name, arguments).await {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) if e.is_protocol_error() => {
                tracing::warn!(tool = name, error = %e, "rejected tool call");
                Err(McpError::invalid_params(e.to_string(), None))
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

impl ServerHandler for FoundryMcpHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                prompts: None,
                resources: None,
                tools: Some(ToolsCapability {
                    list_changed: None,
                }),
                logging: None,
                completions: None,
                experimental: None,
            },
            server_info: Implementation {
                name: "foundry-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Foundry MCP Server".to_string()),
                icons: None,
                website_url: Some("https://github.com/foundry-rs/foundry".to_string()),
            },
            instructions: Some("MCP server exposing Foundry as tools: run a local anvil node, query and transact on chains with cast, and run forge scripts from a persistent workspace project. RPC arguments accept a URL or a foundry.toml rpc_endpoints alias and default to the configured RPC URL.".into()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.handle_call(&request.name, request.arguments).await
    }
}
