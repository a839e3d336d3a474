// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
//! Caller-side progress display state.
//!
//! The pipeline reports enumerated [`Milestone`]s; this module maps them to
//! the section / fraction display model.  The mapping is presentation
//! logic – the pipeline itself never sees sections or fractions.

use learnpath_core::Milestone;

/// Display section a progress line is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Setup,
    Integration,
    Generation,
    Complete,
    Progress,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Setup => write!(f, "Setup"),
            Section::Integration => write!(f, "Integration"),
            Section::Generation => write!(f, "Generation"),
            Section::Complete => write!(f, "Complete"),
            Section::Progress => write!(f, "Progress"),
        }
    }
}

/// The only state that persists across one invocation, observable by the
/// display layer while the pipeline is still running.
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub current_step: String,
    pub section: Section,
    pub fraction_complete: f32,
    pub is_generating: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            current_step: String::new(),
            section: Section::Progress,
            fraction_complete: 0.0,
            is_generating: false,
        }
    }
}

impl ProgressState {
    /// Reset for a new invocation.
    pub fn start(&mut self) {
        *self = Self { is_generating: true, ..Self::default() };
    }

    /// Apply one milestone notification.
    ///
    /// Milestones without an entry in the fraction table advance nothing:
    /// they keep the current section and fraction (the fraction is clamped
    /// to be monotonically non-decreasing either way).
    pub fn apply(&mut self, milestone: &Milestone) {
        self.current_step = milestone.message();

        let advance = match milestone {
            Milestone::SetupStarted => Some((Section::Setup, 0.1)),
            Milestone::IntegrationAdded { .. } => Some((Section::Integration, 0.2)),
            Milestone::AgentCreating => Some((Section::Setup, 0.3)),
            Milestone::GenerationStarted => Some((Section::Generation, 0.5)),
            Milestone::GenerationComplete => Some((Section::Complete, 1.0)),
            Milestone::ClientInitialized
            | Milestone::FetchingTools
            | Milestone::SetupComplete => None,
        };

        if let Some((section, fraction)) = advance {
            self.section = section;
            self.fraction_complete = self.fraction_complete.max(fraction);
        }

        if matches!(milestone, Milestone::GenerationComplete) {
            self.is_generating = false;
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn full_run_milestones() -> Vec<Milestone> {
        vec![
            Milestone::SetupStarted,
            Milestone::IntegrationAdded { integration: "Google Drive" },
            Milestone::ClientInitialized,
            Milestone::FetchingTools,
            Milestone::AgentCreating,
            Milestone::SetupComplete,
            Milestone::GenerationStarted,
            Milestone::GenerationComplete,
        ]
    }

    #[test]
    fn fraction_table_matches_the_legacy_mapping() {
        let mut state = ProgressState::default();
        state.start();

        state.apply(&Milestone::SetupStarted);
        assert_eq!(state.section, Section::Setup);
        assert!((state.fraction_complete - 0.1).abs() < f32::EPSILON);

        state.apply(&Milestone::IntegrationAdded { integration: "Notion" });
        assert_eq!(state.section, Section::Integration);
        assert!((state.fraction_complete - 0.2).abs() < f32::EPSILON);

        state.apply(&Milestone::AgentCreating);
        assert_eq!(state.section, Section::Setup);
        assert!((state.fraction_complete - 0.3).abs() < f32::EPSILON);

        state.apply(&Milestone::GenerationStarted);
        assert_eq!(state.section, Section::Generation);
        assert!((state.fraction_complete - 0.5).abs() < f32::EPSILON);

        state.apply(&Milestone::GenerationComplete);
        assert_eq!(state.section, Section::Complete);
        assert!((state.fraction_complete - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn fraction_is_monotonically_non_decreasing() {
        let mut state = ProgressState::default();
        state.start();
        let mut last = 0.0f32;
        for m in full_run_milestones() {
            state.apply(&m);
            assert!(
                state.fraction_complete >= last,
                "fraction decreased on {m:?}: {} -> {}",
                last,
                state.fraction_complete
            );
            last = state.fraction_complete;
        }
        assert!((last - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn note_milestones_keep_section_and_fraction() {
        let mut state = ProgressState::default();
        state.start();
        state.apply(&Milestone::SetupStarted);

        state.apply(&Milestone::ClientInitialized);
        assert_eq!(state.section, Section::Setup);
        assert!((state.fraction_complete - 0.1).abs() < f32::EPSILON);
        assert_eq!(state.current_step, "Initializing MCP client... ✅");
    }

    #[test]
    fn completion_clears_is_generating() {
        let mut state = ProgressState::default();
        state.start();
        assert!(state.is_generating);
        for m in full_run_milestones() {
            state.apply(&m);
        }
        assert!(!state.is_generating);
    }

    #[test]
    fn start_resets_previous_invocation_state() {
        let mut state = ProgressState::default();
        state.start();
        for m in full_run_milestones() {
            state.apply(&m);
        }
        state.start();
        assert_eq!(state.fraction_complete, 0.0);
        assert!(state.is_generating);
        assert!(state.current_step.is_empty());
    }

    #[test]
    fn current_step_always_carries_the_latest_message() {
        let mut state = ProgressState::default();
        state.start();
        state.apply(&Milestone::GenerationStarted);
        assert_eq!(state.current_step, "Generating your learning path...");
    }
}
