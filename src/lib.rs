//! Foundry MCP Server
//!
//! A Model Context Protocol (MCP) server that exposes the Foundry toolchain as tools:
//! a local anvil node, cast queries and transactions, and forge scripts run from a
//! persistent workspace project.

pub mod anvil;
pub mod cast;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod forge;
pub mod foundry;
pub mod handlers;
pub mod node;
pub mod rpc;
pub mod schema;
pub mod server;
pub mod workspace;

pub use server::FoundryMcpHandler;
