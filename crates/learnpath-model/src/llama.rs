// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Driver for a locally hosted llama.cpp server.
//!
//! llama.cpp's `llama-server` speaks the OpenAI-compatible
//! `/chat/completions` SSE streaming wire format, so this driver is a plain
//! HTTP client with no authentication.  Generation parameters (max tokens,
//! temperature, batch size) are fixed at construction from
//! [`learnpath_config::EngineConfig`].

use anyhow::{bail, Context};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::debug;

use learnpath_config::EngineConfig;

use crate::{provider::ResponseStream, CompletionRequest, ResponseEvent, Role};

pub struct LlamaServerProvider {
    /// Model id forwarded to the server (informational for llama.cpp).
    model: String,
    /// Full chat completions URL, e.g. `http://localhost:8080/v1/chat/completions`.
    chat_url: String,
    /// Context window the server was launched with.  Not sent on the wire;
    /// exposed so callers can size their prompts.
    context_window: u32,
    max_tokens: u32,
    temperature: f32,
    /// Prompt evaluation batch size, forwarded as llama.cpp's `n_batch`.
    batch_size: u32,
    client: reqwest::Client,
}

impl LlamaServerProvider {
    pub fn new(cfg: &EngineConfig) -> Self {
        let base = cfg.base_url.trim_end_matches('/');
        Self {
            model: cfg.model.clone(),
            chat_url: format!("{base}/chat/completions"),
            context_window: cfg.context_window,
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            batch_size: cfg.batch_size,
            client: reqwest::Client::new(),
        }
    }

    pub fn context_window(&self) -> u32 {
        self.context_window
    }
}

#[async_trait]
impl crate::ModelProvider for LlamaServerProvider {
    fn name(&self) -> &str {
        "llama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: CompletionRequest) -> anyhow::Result<ResponseStream> {
        let messages = build_wire_messages(&req.messages);

        let tools: Vec<Value> = req.tools.iter().map(|t| json!({
            "type": "function",
            "function": {
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            }
        })).collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": req.stream,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            // llama.cpp-specific: prompt evaluation batch size.  Unknown to
            // other OpenAI-compatible servers, which ignore it.
            "n_batch": self.batch_size,
            "stream_options": { "include_usage": true },
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        debug!(
            model = %self.model,
            tool_count = tools.len(),
            message_count = messages.len(),
            "sending completion request"
        );

        let resp = self.client.post(&self.chat_url).json(&body).send().await
            .context("llama server request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("llama server error {status}: {text}");
        }

        let byte_stream = resp.bytes_stream();
        // SSE events can be split across multiple TCP packets.  Maintain a
        // line buffer across chunks; emit events only for complete lines.
        let event_stream = byte_stream
            .scan(String::new(), |buf, chunk| {
                let events: Vec<anyhow::Result<ResponseEvent>> = match chunk {
                    Ok(b) => {
                        buf.push_str(&String::from_utf8_lossy(&b));
                        drain_complete_sse_lines(buf)
                    }
                    Err(e) => vec![Err(anyhow::anyhow!(e))],
                };
                std::future::ready(Some(events))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(event_stream))
    }
}

/// Parse a single complete SSE `data:` line into a [`ResponseEvent`].
///
/// Returns `None` for empty lines, comment lines, or unparseable data.
fn parse_sse_data_line(line: &str) -> Option<anyhow::Result<ResponseEvent>> {
    let data = line.strip_prefix("data: ")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(Ok(ResponseEvent::Done));
    }
    let v: Value = serde_json::from_str(data).ok()?;
    Some(parse_sse_chunk(&v))
}

/// Drain all complete `\n`-terminated SSE lines from `buf`.
///
/// Any trailing incomplete line (bytes not yet terminated by `\n`) is left
/// in `buf` so it can be extended by the next TCP chunk.  This is necessary
/// because a single SSE event may be split across multiple TCP packets.
pub(crate) fn drain_complete_sse_lines(buf: &mut String) -> Vec<anyhow::Result<ResponseEvent>> {
    let mut events = Vec::new();
    while let Some(nl_pos) = buf.find('\n') {
        // Strip the optional Windows-style \r before \n.
        let line = buf[..nl_pos].trim_end_matches('\r').to_string();
        // Advance buffer past the consumed line including the \n.
        *buf = buf[nl_pos + 1..].to_string();
        if let Some(ev) = parse_sse_data_line(&line) {
            events.push(ev);
        }
    }
    events
}

fn role_str(r: &Role) -> &'static str {
    match r {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn parse_sse_chunk(v: &Value) -> anyhow::Result<ResponseEvent> {
    // Usage-only chunk (emitted when stream_options.include_usage = true)
    if let Some(usage) = v.get("usage").filter(|u| !u.is_null()) {
        return Ok(ResponseEvent::Usage {
            input_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: usage["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });
    }

    // llama.cpp performance metrics (top-level `timings` object).  These
    // arrive in the final SSE chunk and report prompt/generation token counts
    // separately; combine them into a standard Usage event.
    if let Some(timings) = v.get("timings") {
        let cache_n = timings["cache_n"].as_u64().unwrap_or(0) as u32;
        let prompt_n = timings["prompt_n"].as_u64().unwrap_or(0) as u32;
        let predicted_n = timings["predicted_n"].as_u64().unwrap_or(0) as u32;
        return Ok(ResponseEvent::Usage {
            input_tokens: cache_n + prompt_n,
            output_tokens: predicted_n,
        });
    }

    let choice = &v["choices"][0];
    let delta = &choice["delta"];

    // Tool call delta — parallel tool calls are identified by an "index"
    // field; each SSE chunk carries exactly one tool-call delta in practice,
    // and the index routes accumulation in the agent.
    if let Some(tool_calls) = delta.get("tool_calls") {
        if let Some(tc) = tool_calls.get(0) {
            let index = tc["index"].as_u64().unwrap_or(0) as u32;
            let id = tc["id"].as_str().unwrap_or("").to_string();
            let name = tc["function"]["name"].as_str().unwrap_or("").to_string();
            let args = tc["function"]["arguments"].as_str().unwrap_or("").to_string();
            return Ok(ResponseEvent::ToolCall { index, id, name, arguments: args });
        }
    }

    // Thinking delta — llama.cpp surfaces chain-of-thought text for
    // reasoning-capable models (QwQ, DeepSeek-R1, Qwen3) as
    // `reasoning_content`.  It must stay out of the final answer text.
    if let Some(thinking) = delta.get("reasoning_content").and_then(|c| c.as_str()) {
        if !thinking.is_empty() {
            return Ok(ResponseEvent::ThinkingDelta(thinking.to_string()));
        }
    }

    // Text delta
    if let Some(text) = delta.get("content").and_then(|c| c.as_str()) {
        return Ok(ResponseEvent::TextDelta(text.to_string()));
    }

    Ok(ResponseEvent::TextDelta(String::new()))
}

/// Convert a slice of [`Message`]s into the OpenAI wire-format JSON array.
///
/// **Parallel tool call coalescing**: the wire format requires that all tool
/// calls from one assistant turn appear inside a *single* assistant message
/// as a `tool_calls` array.  The agent stores each tool call as a separate
/// `MessageContent::ToolCall` entry internally (easier to work with), so this
/// function merges consecutive `ToolCall` messages into one JSON object
/// before sending them to the API.
pub(crate) fn build_wire_messages(messages: &[crate::Message]) -> Vec<Value> {
    use crate::MessageContent;

    fn tool_call_to_json(tool_call_id: &str, function: &crate::FunctionCall) -> Value {
        json!({
            "id": tool_call_id,
            "type": "function",
            "function": {
                "name": function.name,
                "arguments": function.arguments,
            }
        })
    }

    let mut result: Vec<Value> = Vec::with_capacity(messages.len());
    let mut i = 0;

    while i < messages.len() {
        let m = &messages[i];

        // Merge consecutive ToolCall messages into one assistant message so
        // the wire format satisfies the parallel-tool-call contract.
        if let MessageContent::ToolCall { tool_call_id, function } = &m.content {
            let mut calls = vec![tool_call_to_json(tool_call_id, function)];
            i += 1;
            while i < messages.len() {
                if let MessageContent::ToolCall { tool_call_id, function } = &messages[i].content {
                    calls.push(tool_call_to_json(tool_call_id, function));
                    i += 1;
                } else {
                    break;
                }
            }
            result.push(json!({ "role": "assistant", "tool_calls": calls }));
            continue;
        }

        let v = match &m.content {
            MessageContent::Text(t) => json!({
                "role": role_str(&m.role),
                "content": t,
            }),
            MessageContent::ToolResult { tool_call_id, content } => json!({
                "role": "tool",
                "tool_call_id": tool_call_id,
                "content": content,
            }),
            MessageContent::ToolCall { .. } => unreachable!("handled above"),
        };
        result.push(v);
        i += 1;
    }

    result
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FunctionCall, Message, MessageContent};

    #[test]
    fn wire_messages_preserve_roles() {
        let msgs = vec![Message::system("sys"), Message::user("hi")];
        let wire = build_wire_messages(&msgs);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[1]["content"], "hi");
    }

    #[test]
    fn consecutive_tool_calls_coalesce_into_one_assistant_message() {
        let tc = |id: &str| Message {
            role: Role::Assistant,
            content: MessageContent::ToolCall {
                tool_call_id: id.into(),
                function: FunctionCall { name: "search".into(), arguments: "{}".into() },
            },
        };
        let msgs = vec![Message::user("go"), tc("a"), tc("b")];
        let wire = build_wire_messages(&msgs);
        assert_eq!(wire.len(), 2);
        assert_eq!(wire[1]["tool_calls"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn tool_result_maps_to_tool_role() {
        let msgs = vec![Message::tool_result("call-1", "found 3 videos")];
        let wire = build_wire_messages(&msgs);
        assert_eq!(wire[0]["role"], "tool");
        assert_eq!(wire[0]["tool_call_id"], "call-1");
        assert_eq!(wire[0]["content"], "found 3 videos");
    }

    #[test]
    fn sse_done_sentinel_parses() {
        let mut buf = "data: [DONE]\n".to_string();
        let events = drain_complete_sse_lines(&mut buf);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Ok(ResponseEvent::Done)));
    }

    #[test]
    fn sse_incomplete_line_stays_buffered() {
        let mut buf = "data: {\"choices\":[{\"delta\":{\"content\":\"he".to_string();
        let events = drain_complete_sse_lines(&mut buf);
        assert!(events.is_empty());
        assert!(!buf.is_empty(), "partial line must remain in the buffer");

        buf.push_str("llo\"}}]}\n");
        let events = drain_complete_sse_lines(&mut buf);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Ok(ResponseEvent::TextDelta(t)) if t == "hello"));
        assert!(buf.is_empty());
    }

    #[test]
    fn sse_text_delta_parses() {
        let v: Value =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Day 1"}}]}"#).unwrap();
        let ev = parse_sse_chunk(&v).unwrap();
        assert!(matches!(ev, ResponseEvent::TextDelta(t) if t == "Day 1"));
    }

    #[test]
    fn sse_reasoning_content_becomes_thinking_delta() {
        let v: Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"reasoning_content":"let me plan"}}]}"#,
        ).unwrap();
        let ev = parse_sse_chunk(&v).unwrap();
        assert!(matches!(ev, ResponseEvent::ThinkingDelta(t) if t == "let me plan"));
    }

    #[test]
    fn sse_tool_call_delta_parses() {
        let v: Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"index":0,"id":"c1","function":{"name":"search_videos","arguments":"{\"q\":"}}]}}]}"#,
        ).unwrap();
        let ev = parse_sse_chunk(&v).unwrap();
        match ev {
            ResponseEvent::ToolCall { index, id, name, arguments } => {
                assert_eq!(index, 0);
                assert_eq!(id, "c1");
                assert_eq!(name, "search_videos");
                assert_eq!(arguments, "{\"q\":");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn sse_usage_chunk_parses() {
        let v: Value = serde_json::from_str(
            r#"{"choices":[],"usage":{"prompt_tokens":12,"completion_tokens":34}}"#,
        ).unwrap();
        let ev = parse_sse_chunk(&v).unwrap();
        assert!(matches!(ev, ResponseEvent::Usage { input_tokens: 12, output_tokens: 34 }));
    }

    #[test]
    fn llama_timings_map_to_usage() {
        let v: Value = serde_json::from_str(
            r#"{"choices":[],"timings":{"cache_n":100,"prompt_n":20,"predicted_n":50}}"#,
        ).unwrap();
        let ev = parse_sse_chunk(&v).unwrap();
        assert!(matches!(ev, ResponseEvent::Usage { input_tokens: 120, output_tokens: 50 }));
    }

    #[test]
    fn provider_reports_configured_context_window() {
        let cfg = learnpath_config::EngineConfig::default();
        let p = LlamaServerProvider::new(&cfg);
        assert_eq!(p.context_window(), cfg.context_window);
    }
}
