// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Result normalization: collapse whatever shape the agent produced into the
//! single plan string handed back to the caller.

use serde_json::Value;

use learnpath_model::{Message, Role};

/// Marker phrase that opens the final answer.  Anything the engine leaked
/// before it (reasoning traces, tool chatter) is discarded.
pub const ANSWER_MARKER: &str = "Here is your comprehensive";

/// The heterogeneous result of one agent run, resolved into an explicit
/// shape exactly once, at this boundary.
#[derive(Debug, Clone)]
pub enum AgentResult {
    /// A mapping carrying the conversation transcript.
    Messages { messages: Vec<Message> },
    /// A bare transcript without the wrapping map.
    Sequence(Vec<Message>),
    /// Anything else the agent produced.
    Opaque(Value),
}

/// Extract the plan text.
///
/// For transcript shapes this is the last assistant-authored text message;
/// when none exists, the transcript's string representation is used instead
/// (graceful degradation, not an error).  Opaque strings pass through
/// unchanged, other opaque values use their JSON representation.
///
/// Returns `None` when the extracted text is empty – the caller surfaces
/// that as a "no results" failure.
pub fn normalize(result: &AgentResult) -> Option<String> {
    let content = match result {
        AgentResult::Messages { messages } | AgentResult::Sequence(messages) => {
            match last_assistant_text(messages) {
                Some(text) => text.to_string(),
                None => transcript_repr(messages),
            }
        }
        AgentResult::Opaque(Value::String(s)) => s.clone(),
        AgentResult::Opaque(other) => other.to_string(),
    };

    let content = strip_before_marker(content);
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}

/// Last message authored by the engine (not a tool or the user) that carries
/// plain text.
fn last_assistant_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .find_map(|m| m.as_text())
}

/// String representation used when no assistant message exists.
fn transcript_repr(messages: &[Message]) -> String {
    serde_json::to_string(messages).unwrap_or_default()
}

/// Discard everything before the answer marker, keeping the marker itself.
fn strip_before_marker(content: String) -> String {
    match content.find(ANSWER_MARKER) {
        Some(idx) => content[idx..].to_string(),
        None => content,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
