use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use learnpath_tools::{Tool, ToolCall, ToolOutput};

use crate::client::{McpClient, ToolDescriptor};

/// A discovered MCP tool exposed through the [`Tool`] trait.
///
/// Transport failures during `tools/call` are reported back to the model as
/// tool-output errors; only discovery failures are fatal for the invocation.
#[derive(Debug)]
pub struct RemoteTool {
    client: Arc<McpClient>,
    descriptor: ToolDescriptor,
}

impl RemoteTool {
    pub fn new(client: Arc<McpClient>, descriptor: ToolDescriptor) -> Self {
        Self { client, descriptor }
    }

    /// The server this tool was discovered from.
    pub fn server_name(&self) -> &str {
        self.client.server_name()
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters_schema(&self) -> Value {
        self.descriptor.input_schema.clone()
    }

    async fn execute(&self, call: &ToolCall) -> ToolOutput {
        match self.client.call_tool(&self.descriptor.name, call.args.clone()).await {
            Ok(outcome) if outcome.is_error => ToolOutput::err(&call.id, outcome.text),
            Ok(outcome) => ToolOutput::ok(&call.id, outcome.text),
            Err(e) => {
                warn!(tool = %self.descriptor.name, error = %e, "remote tool call failed");
                ToolOutput::err(&call.id, e.to_string())
            }
        }
    }
}
