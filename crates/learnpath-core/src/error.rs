use thiserror::Error;

use learnpath_mcp::{ConfigError, McpError};

/// Everything that can abort one pipeline invocation.
///
/// All variants are fatal and propagate to the caller unmodified; the
/// pipeline never retries.  Unrecognized result shapes are *not* errors –
/// normalization degrades to a string representation instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Endpoint configuration rejected before any network call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A tool endpoint was unreachable or served a bad manifest.
    #[error(transparent)]
    Discovery(#[from] McpError),

    /// The reasoning backend failed to respond or failed mid-generation.
    #[error("reasoning engine failure: {0}")]
    Engine(anyhow::Error),

    /// The reasoning loop hit its step ceiling without converging.
    /// Distinct from [`PipelineError::Engine`]: the engine itself did not
    /// fail, it failed to produce a final answer.
    #[error("reasoning loop exceeded the {limit}-step ceiling without a final answer")]
    StepLimitExceeded { limit: u32 },

    /// Normalization produced an empty plan.
    #[error("no results were generated")]
    NoResults,

    /// The per-invocation execution context could not be created.
    #[error("failed to start the pipeline runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
