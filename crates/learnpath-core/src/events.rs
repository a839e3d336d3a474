// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT

/// Milestones emitted by the pipeline during one invocation.
///
/// Each milestone is an explicit tag, not a free-text message: receivers
/// dispatch on the variant rather than sniffing substrings.  The legacy
/// message strings are preserved verbatim in [`Milestone::message`] so
/// existing progress displays render identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Milestone {
    /// Pipeline setup has begun.
    SetupStarted,
    /// A secondary tool integration was bound into the server set.
    IntegrationAdded {
        /// Human-readable integration name ("Google Drive" or "Notion")
        integration: &'static str,
    },
    /// The multi-server MCP client is being created.
    ClientInitialized,
    /// Tool manifests are being resolved from the configured servers.
    FetchingTools,
    /// The agent is being assembled from the engine and the tool set.
    AgentCreating,
    /// Setup finished; generation is about to start.
    SetupComplete,
    /// The reasoning loop started producing the plan.
    GenerationStarted,
    /// The plan was produced; generation is no longer in progress.
    GenerationComplete,
}

impl Milestone {
    /// The legacy progress message for this milestone, verbatim.
    pub fn message(&self) -> String {
        match self {
            Milestone::SetupStarted => "Setting up agent with tools... ✅".to_string(),
            Milestone::IntegrationAdded { integration } => {
                format!("Added {integration} integration... ✅")
            }
            Milestone::ClientInitialized => "Initializing MCP client... ✅".to_string(),
            Milestone::FetchingTools => "Getting available tools... ✅".to_string(),
            Milestone::AgentCreating => "Creating AI agent... ✅".to_string(),
            Milestone::SetupComplete => {
                "Setup complete! Starting to generate learning path... ✅".to_string()
            }
            Milestone::GenerationStarted => "Generating your learning path...".to_string(),
            Milestone::GenerationComplete => "Learning path generation complete!".to_string(),
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
