// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Execution driver: one end-to-end invocation of the pipeline.

use std::sync::Arc;

use tracing::{debug, error, info};

use learnpath_config::Config;
use learnpath_mcp::{discover_tools, Integration, ServerSet};
use learnpath_tools::ToolRegistry;

use crate::agent::Agent;
use crate::error::PipelineError;
use crate::events::Milestone;
use crate::normalize::{normalize, AgentResult};
use crate::prompts;

/// One invocation request, handed over from the presentation layer.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Mandatory YouTube MCP endpoint URL.
    pub youtube_url: String,
    /// At most one secondary integration (Drive or Notion).
    pub secondary: Option<Integration>,
    /// The user's learning goal.
    pub goal: String,
}

/// Per-invocation progress sink.  Injected as a parameter so repeated
/// invocations never share state.
pub type ProgressSink<'a> = Option<&'a (dyn Fn(&Milestone) + Send + Sync)>;

fn notify(progress: ProgressSink<'_>, milestone: Milestone) {
    info!("{milestone}");
    if let Some(sink) = progress {
        sink(&milestone);
    }
}

/// Run one full invocation: build the server set, discover tools, assemble
/// the agent, run it, and normalize the result into the plan text.
///
/// Fatal errors are logged here and propagated unmodified; there are no
/// retries.  Either a full plan is produced or the invocation fails.
pub async fn generate_plan(
    config: &Config,
    request: &PlanRequest,
    progress: ProgressSink<'_>,
) -> Result<String, PipelineError> {
    notify(progress, Milestone::SetupStarted);

    let servers = ServerSet::build(&request.youtube_url, request.secondary.as_ref())
        .inspect_err(|e| error!("endpoint configuration rejected: {e}"))?;
    if let Some(integration) = &request.secondary {
        notify(progress, Milestone::IntegrationAdded { integration: integration.label() });
    }

    notify(progress, Milestone::ClientInitialized);
    notify(progress, Milestone::FetchingTools);
    let tools = discover_tools(&servers)
        .await
        .inspect_err(|e| error!("tool discovery failed: {e}"))?;

    notify(progress, Milestone::AgentCreating);
    let model = learnpath_model::from_config(&config.engine)
        .map_err(PipelineError::Engine)
        .inspect_err(|e| error!("engine construction failed: {e}"))?;
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    debug!(tool_count = registry.len(), "tool registry ready");
    let mut agent = Agent::new(Arc::from(model), Arc::new(registry), config.agent.max_steps);
    notify(progress, Milestone::SetupComplete);

    let prompt = prompts::compose_prompt(&request.goal);
    notify(progress, Milestone::GenerationStarted);

    let transcript = agent
        .run(&prompt)
        .await
        .inspect_err(|e| error!("agent run failed: {e}"))?;

    notify(progress, Milestone::GenerationComplete);

    let result = AgentResult::Messages { messages: transcript };
    normalize(&result).ok_or(PipelineError::NoResults)
}

/// Synchronous entry point for callers without a runtime.
///
/// A fresh single-threaded runtime is created for this invocation alone and
/// dropped when the function returns – on success and on every error path –
/// so no executor state leaks between invocations.
pub fn generate_plan_sync(
    config: &Config,
    request: &PlanRequest,
    progress: ProgressSink<'_>,
) -> Result<String, PipelineError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(PipelineError::Runtime)?;
    runtime.block_on(generate_plan(config, request, progress))
}
