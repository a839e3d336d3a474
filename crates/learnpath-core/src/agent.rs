// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use learnpath_model::{
    CompletionRequest, FunctionCall, Message, MessageContent, ModelProvider, ResponseEvent, Role,
};
use learnpath_tools::{ToolCall, ToolRegistry};

use crate::error::PipelineError;

/// The bound agent: one reasoning engine plus one discovered tool set,
/// driving a bounded observe→think→act loop.
///
/// Created once per invocation and discarded afterwards; it holds no state
/// across invocations.
pub struct Agent {
    messages: Vec<Message>,
    tools: Arc<ToolRegistry>,
    model: Arc<dyn ModelProvider>,
    max_steps: u32,
}

impl Agent {
    pub fn new(model: Arc<dyn ModelProvider>, tools: Arc<ToolRegistry>, max_steps: u32) -> Self {
        Self {
            messages: Vec::new(),
            tools,
            model,
            max_steps,
        }
    }

    /// Run the loop to convergence and return the full transcript.
    ///
    /// Each step streams one model turn.  A turn without tool calls is the
    /// final answer; otherwise every requested tool is executed strictly
    /// sequentially, its result appended to the transcript, and the loop
    /// continues.  Exceeding the step ceiling aborts the invocation with
    /// [`PipelineError::StepLimitExceeded`].
    pub async fn run(&mut self, prompt: &str) -> Result<Vec<Message>, PipelineError> {
        self.messages.push(Message::user(prompt));

        let mut steps = 0u32;
        loop {
            steps += 1;
            if steps > self.max_steps {
                return Err(PipelineError::StepLimitExceeded { limit: self.max_steps });
            }

            let (text, tool_calls) = self.stream_one_turn().await?;

            if !text.is_empty() {
                self.messages.push(Message::assistant(&text));
            }

            if tool_calls.is_empty() {
                return Ok(self.messages.clone());
            }

            // Record every requested call before any result, so the wire
            // history groups the whole parallel-tool-call batch correctly.
            for tc in &tool_calls {
                self.messages.push(Message {
                    role: Role::Assistant,
                    content: MessageContent::ToolCall {
                        tool_call_id: tc.id.clone(),
                        function: FunctionCall {
                            name: tc.name.clone(),
                            arguments: tc.args.to_string(),
                        },
                    },
                });
            }

            // Strictly sequential tool execution: one network round trip at
            // a time, results appended in request order.
            for tc in &tool_calls {
                debug!(tool = %tc.name, step = steps, "executing tool call");
                let output = self.tools.execute(tc).await;
                if output.is_error {
                    warn!(tool = %tc.name, output = %output.content, "tool returned an error");
                }
                self.messages.push(Message::tool_result(&tc.id, &output.content));
            }
        }
    }

    /// Call the model once, streaming text deltas and collecting tool-call
    /// events.  Returns (full_text, tool_calls).
    async fn stream_one_turn(&mut self) -> Result<(String, Vec<ToolCall>), PipelineError> {
        let tools: Vec<learnpath_model::ToolSchema> = self
            .tools
            .schemas()
            .into_iter()
            .map(|s| learnpath_model::ToolSchema {
                name: s.name,
                description: s.description,
                parameters: s.parameters,
            })
            .collect();

        let req = CompletionRequest {
            messages: self.messages.clone(),
            tools,
            stream: true,
        };

        let mut stream = self
            .model
            .complete(req)
            .await
            .map_err(|e| PipelineError::Engine(e.context("model completion failed")))?;

        let mut full_text = String::new();
        // Keyed by the parallel-tool-call index from the provider; argument
        // deltas for one call may arrive across several chunks.
        let mut pending_tcs: HashMap<u32, PendingToolCall> = HashMap::new();

        while let Some(event) = stream.next().await {
            match event.map_err(PipelineError::Engine)? {
                ResponseEvent::TextDelta(delta) => {
                    full_text.push_str(&delta);
                }
                ResponseEvent::ThinkingDelta(delta) => {
                    // Reasoning traces never reach the final answer text.
                    debug!(len = delta.len(), "thinking delta");
                }
                ResponseEvent::ToolCall { index, id, name, arguments } => {
                    let ptc = pending_tcs.entry(index).or_insert_with(|| PendingToolCall {
                        id: String::new(),
                        name: String::new(),
                        args_buf: String::new(),
                    });
                    if !id.is_empty() {
                        ptc.id = id;
                    }
                    if !name.is_empty() {
                        ptc.name = name;
                    }
                    ptc.args_buf.push_str(&arguments);
                }
                ResponseEvent::Usage { input_tokens, output_tokens } => {
                    debug!(input_tokens, output_tokens, "turn token usage");
                }
                ResponseEvent::Done => break,
                ResponseEvent::Error(e) => {
                    warn!("model stream error: {e}");
                }
            }
        }

        // Flush accumulated parallel tool calls, ordered by index.  A call
        // with an empty name cannot be dispatched and is dropped – keeping it
        // would corrupt the history sent back on the next turn.  An empty id
        // gets a synthetic fallback so the turn can still complete.
        let mut pending_sorted: Vec<(u32, PendingToolCall)> = pending_tcs.into_iter().collect();
        pending_sorted.sort_by_key(|(idx, _)| *idx);

        let mut tool_calls = Vec::new();
        for (i, (_, ptc)) in pending_sorted.into_iter().enumerate() {
            if ptc.name.is_empty() {
                warn!(
                    tool_call_id = %ptc.id,
                    "dropping tool call with empty name from model; cannot dispatch"
                );
                continue;
            }
            let mut tc = ptc.finish();
            if tc.id.is_empty() {
                tc.id = format!("tc_synthetic_{i}");
                warn!(
                    tool_name = %tc.name,
                    tool_call_id = %tc.id,
                    "tool call from model had empty id; generated synthetic id"
                );
            }
            tool_calls.push(tc);
        }

        Ok((full_text, tool_calls))
    }
}

struct PendingToolCall {
    id: String,
    name: String,
    args_buf: String,
}

impl PendingToolCall {
    fn finish(self) -> ToolCall {
        // Always resolve to a JSON object: tool arguments must be an object,
        // and feeding `null` back into the history breaks the next turn.
        let args = if self.args_buf.is_empty() {
            warn!(
                tool_name = %self.name,
                tool_call_id = %self.id,
                "model sent tool call with empty arguments; substituting {{}}"
            );
            serde_json::Value::Object(Default::default())
        } else {
            match serde_json::from_str(&self.args_buf) {
                Ok(v) => v,
                Err(e) => {
                    warn!(
                        tool_name = %self.name,
                        tool_call_id = %self.id,
                        args_buf = %self.args_buf,
                        error = %e,
                        "model sent tool call with invalid JSON arguments; substituting {{}}"
                    );
                    serde_json::Value::Object(Default::default())
                }
            }
        };
        ToolCall { id: self.id, name: self.name, args }
    }
}
