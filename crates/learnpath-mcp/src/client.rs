// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::endpoint::{ServerConfig, ServerSet};
use crate::remote_tool::RemoteTool;

/// MCP protocol revision this client speaks.
const PROTOCOL_VERSION: &str = "2025-03-26";

/// Fatal errors raised while resolving or talking to an MCP server.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("MCP server '{server}' unreachable: {source}")]
    Connect {
        server: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("MCP server '{server}' protocol error: {message}")]
    Protocol { server: String, message: String },
    #[error("MCP server '{server}' returned a malformed tool manifest: {message}")]
    Manifest { server: String, message: String },
}

/// One invocable tool resolved from a server's manifest.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's arguments object
    pub input_schema: Value,
}

/// Outcome of a `tools/call` round trip.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub text: String,
    pub is_error: bool,
}

/// A connected MCP session against one server.
///
/// The session is established once per invocation by [`McpClient::connect`]
/// and the discovered manifest is reused for the invocation's lifetime.
#[derive(Debug)]
pub struct McpClient {
    http: reqwest::Client,
    server: ServerConfig,
    session_id: Option<String>,
}

impl McpClient {
    /// Open a session: POST the `initialize` handshake and capture the
    /// `Mcp-Session-Id` response header for replay on later requests.
    pub async fn connect(server: ServerConfig) -> Result<Self, McpError> {
        let http = reqwest::Client::new();
        let init = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "learnpath",
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }
        });

        let resp = http
            .post(&server.url)
            .header("Accept", "application/json")
            .header("Accept", "text/event-stream")
            .json(&init)
            .send()
            .await
            .map_err(|e| McpError::Connect { server: server.name.clone(), source: e })?;

        let session_id = resp
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        debug!(server = %server.name, session = ?session_id, "MCP session opened");

        let body = decode_body(&server.name, resp).await?;
        if let Some(err) = body.get("error") {
            return Err(McpError::Protocol {
                server: server.name.clone(),
                message: format!("initialize failed: {err}"),
            });
        }

        Ok(Self { http, server, session_id })
    }

    pub fn server_name(&self) -> &str {
        &self.server.name
    }

    /// POST one JSON-RPC request and return its `result` member.
    async fn request(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        let mut req = self
            .http
            .post(&self.server.url)
            .header("Accept", "application/json")
            .header("Accept", "text/event-stream");
        if let Some(sid) = &self.session_id {
            req = req.header("Mcp-Session-Id", sid);
        }

        let resp = req
            .json(&payload)
            .send()
            .await
            .map_err(|e| McpError::Connect { server: self.server.name.clone(), source: e })?;

        let body = decode_body(&self.server.name, resp).await?;
        if let Some(err) = body.get("error") {
            return Err(McpError::Protocol {
                server: self.server.name.clone(),
                message: format!("{method} failed: {err}"),
            });
        }
        body.get("result").cloned().ok_or_else(|| McpError::Protocol {
            server: self.server.name.clone(),
            message: format!("{method} response carried no result"),
        })
    }

    /// Resolve the server's tool manifest via `tools/list`.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let result = self.request("tools/list", json!({})).await?;
        parse_manifest(&result).map_err(|message| {
            error!(server = %self.server.name, %message, "malformed tool manifest");
            McpError::Manifest { server: self.server.name.clone(), message }
        })
    }

    /// Invoke one tool via `tools/call` and flatten its text content.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallOutcome, McpError> {
        let result = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;

        let is_error = result.get("isError").and_then(|v| v.as_bool()).unwrap_or(false);
        let text = result
            .get("content")
            .and_then(|c| c.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Ok(CallOutcome { text, is_error })
    }
}

/// Resolve every server in the set and aggregate their tools, preserving
/// server order.  Any failure aborts the whole discovery – no partial sets.
pub async fn discover_tools(set: &ServerSet) -> Result<Vec<RemoteTool>, McpError> {
    let mut tools = Vec::new();
    for server in set.servers() {
        let client = Arc::new(McpClient::connect(server.clone()).await?);
        let descriptors = client.list_tools().await?;
        debug!(
            server = %client.server_name(),
            count = descriptors.len(),
            "discovered MCP tools"
        );
        for descriptor in descriptors {
            tools.push(RemoteTool::new(Arc::clone(&client), descriptor));
        }
    }
    Ok(tools)
}

/// Decode a streamable-HTTP response body.
///
/// Servers answer POSTed JSON-RPC requests either with plain JSON or with a
/// short SSE frame whose last `data:` line carries the JSON-RPC response.
async fn decode_body(server: &str, resp: reqwest::Response) -> Result<Value, McpError> {
    let status = resp.status();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let body = resp
        .text()
        .await
        .map_err(|e| McpError::Connect { server: server.to_string(), source: e })?;

    if !status.is_success() {
        return Err(McpError::Protocol {
            server: server.to_string(),
            message: format!("HTTP {status}: {body}"),
        });
    }

    let data = if content_type.contains("text/event-stream") {
        sse_last_data_line(&body).ok_or_else(|| McpError::Protocol {
            server: server.to_string(),
            message: "no data line in SSE response".to_string(),
        })?
    } else {
        body.as_str()
    };

    serde_json::from_str(data).map_err(|e| McpError::Protocol {
        server: server.to_string(),
        message: format!("invalid JSON-RPC body: {e}"),
    })
}

/// Last non-empty `data:` line of an SSE frame.
fn sse_last_data_line(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|data| !data.trim().is_empty())
        .last()
}

/// Parse a `tools/list` result into descriptors.
///
/// A missing `tools` array, or any entry without a name, makes the whole
/// manifest malformed.
fn parse_manifest(result: &Value) -> Result<Vec<ToolDescriptor>, String> {
    let tools = result
        .get("tools")
        .and_then(|t| t.as_array())
        .ok_or_else(|| "missing tools array".to_string())?;

    tools
        .iter()
        .map(|tool| {
            let name = tool
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| "tool entry missing name".to_string())?;
            Ok(ToolDescriptor {
                name: name.to_string(),
                description: tool
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or_default()
                    .to_string(),
                input_schema: tool
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object" })),
            })
        })
        .collect()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_last_data_line_picks_final_payload() {
        let body = "event: message\ndata: {\"a\":1}\n\ndata: {\"b\":2}\n\n";
        assert_eq!(sse_last_data_line(body), Some("{\"b\":2}"));
    }

    #[test]
    fn sse_last_data_line_ignores_blank_data() {
        let body = "data: {\"a\":1}\ndata: \n";
        assert_eq!(sse_last_data_line(body), Some("{\"a\":1}"));
    }

    #[test]
    fn sse_last_data_line_none_without_data() {
        assert_eq!(sse_last_data_line(": keep-alive\n\n"), None);
    }

    #[test]
    fn manifest_parses_name_description_and_schema() {
        let result = json!({
            "tools": [{
                "name": "search_videos",
                "description": "Search YouTube",
                "inputSchema": { "type": "object", "properties": { "query": { "type": "string" } } }
            }]
        });
        let tools = parse_manifest(&result).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search_videos");
        assert_eq!(tools[0].description, "Search YouTube");
        assert_eq!(tools[0].input_schema["type"], "object");
    }

    #[test]
    fn manifest_defaults_missing_schema_to_empty_object() {
        let result = json!({ "tools": [{ "name": "t" }] });
        let tools = parse_manifest(&result).unwrap();
        assert_eq!(tools[0].input_schema, json!({ "type": "object" }));
    }

    #[test]
    fn manifest_without_tools_array_is_malformed() {
        let err = parse_manifest(&json!({ "nope": [] })).unwrap_err();
        assert!(err.contains("missing tools array"));
    }

    #[test]
    fn manifest_entry_without_name_is_malformed() {
        let err = parse_manifest(&json!({ "tools": [{ "description": "x" }] })).unwrap_err();
        assert!(err.contains("missing name"));
    }

    #[test]
    fn manifest_preserves_server_order() {
        let result = json!({
            "tools": [
                { "name": "b_tool" },
                { "name": "a_tool" }
            ]
        });
        let tools = parse_manifest(&result).unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b_tool", "a_tool"]);
    }
}
