// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Settings for the local reasoning engine.
///
/// The engine is a locally hosted llama.cpp server speaking the
/// OpenAI-compatible `/v1/chat/completions` wire format.  All fields are
/// fixed at provider construction; nothing here changes mid-invocation.
///
/// ```toml
/// [engine]
/// provider = "llama"
/// base_url = "http://localhost:8080/v1"
/// model = "grok-3-reasoning-gemma3-12b"
/// context_window = 4096
/// max_tokens = 2048
/// temperature = 0.7
/// batch_size = 16
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine driver: "llama" (local llama.cpp server) or "mock" (tests)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// API base that ends before `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name forwarded to the server (informational for llama.cpp,
    /// which serves whatever model it was launched with)
    #[serde(default = "default_model")]
    pub model: String,
    /// Context window the server was launched with
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    /// Maximum tokens generated per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature (0.0–2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Prompt evaluation batch size forwarded to the server
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_provider() -> String {
    "llama".to_string()
}
fn default_base_url() -> String {
    "http://localhost:8080/v1".to_string()
}
fn default_model() -> String {
    "local".to_string()
}
fn default_context_window() -> u32 {
    4096
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.7
}
fn default_batch_size() -> u32 {
    16
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            context_window: default_context_window(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of reasoning steps before the run is aborted.
    /// Exceeding this ceiling is a hard error, not a soft stop.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_max_steps() -> u32 {
    50
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_steps: default_max_steps() }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
