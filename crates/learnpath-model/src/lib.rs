mod llama;
mod mock;
mod provider;
mod types;

pub use llama::LlamaServerProvider;
pub use mock::{MockProvider, ScriptedMockProvider};
pub use provider::{ModelProvider, ResponseStream};
pub use types::*;

use anyhow::bail;
use learnpath_config::EngineConfig;

/// Construct a boxed [`ModelProvider`] from configuration.
///
/// Provider selection:
/// - `"llama"` → [`LlamaServerProvider`] (local llama.cpp server)
/// - `"mock"` → [`MockProvider`] (echo-back, tests only)
pub fn from_config(cfg: &EngineConfig) -> anyhow::Result<Box<dyn ModelProvider>> {
    match cfg.provider.as_str() {
        "llama" => Ok(Box::new(LlamaServerProvider::new(cfg))),
        "mock" => Ok(Box::new(MockProvider)),
        other => bail!("unknown engine provider: {other}"),
    }
}
