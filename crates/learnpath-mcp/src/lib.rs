// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! MCP client – resolves the tool set the agent runs with.
//!
//! Each configured endpoint is an MCP server reached over the streamable
//! HTTP transport (MCP 2025-03-26): JSON-RPC requests are POSTed to the
//! endpoint URL, responses arrive either as plain JSON or as an SSE frame,
//! and the `Mcp-Session-Id` response header from `initialize` is replayed
//! on every subsequent request.
//!
//! Discovery is all-or-nothing: if any endpoint is unreachable or returns a
//! malformed tool manifest, the whole invocation is aborted – no partial
//! tool sets.

mod client;
mod endpoint;
mod remote_tool;

pub use client::{discover_tools, CallOutcome, McpClient, McpError, ToolDescriptor};
pub use endpoint::{ConfigError, Integration, ServerConfig, ServerSet, Transport};
pub use remote_tool::RemoteTool;
