//! Model Context Protocol (MCP) server for archgrade.
//!
//! Tools are thin handlers: they resolve services from the shared `Context`
//! and delegate to the evaluation pipeline.
//!
//! ## Modules
//!
//! - `server`: MCP server implementation with tool router
//! - `protocol`: response helpers (JSON/TOON output, pagination)
//! - `tools`: tool implementations organized by domain

pub mod protocol;
pub(crate) mod server;
mod tools;

pub use server::McpServer;
