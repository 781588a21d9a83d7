//! Workspace-level integration tests for the Family Guy MCP converter.
//!
//! These tests verify:
//! - The server starts and advertises the tools capability
//! - The `convertToFamilyGuy` schema is well formed
//! - Successful results are MCP image content
//! - A full MCP session over authenticated streamable HTTP

pub mod http_session;
pub mod server_startup;
