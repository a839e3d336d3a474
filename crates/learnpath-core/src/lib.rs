// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Core pipeline: assembles an agent from a reasoning engine and discovered
//! MCP tools, runs it to convergence, and normalizes the result into the
//! final plan text.

mod agent;
mod driver;
mod error;
mod events;
pub mod normalize;
pub mod prompts;

pub use agent::Agent;
pub use driver::{generate_plan, generate_plan_sync, PlanRequest, ProgressSink};
pub use error::PipelineError;
pub use events::Milestone;
pub use normalize::{AgentResult, ANSWER_MARKER};
