// Copyright (c) 2025-2026 Learnpath Contributors
//
// SPDX-License-Identifier: MIT
use clap::Parser;
use std::path::PathBuf;

use learnpath_mcp::Integration;

#[derive(Parser, Debug)]
#[command(
    name = "learnpath",
    about = "Generate a day-wise learning path with MCP tools and a local LLM",
    version,
    long_about = None,
)]
pub struct Cli {
    /// YouTube MCP endpoint URL (required)
    #[arg(long, env = "LEARNPATH_YOUTUBE_URL", value_name = "URL")]
    pub youtube_url: String,

    /// Google Drive MCP endpoint URL (secondary integration)
    #[arg(long, value_name = "URL", conflicts_with = "notion_url")]
    pub drive_url: Option<String>,

    /// Notion MCP endpoint URL (secondary integration)
    #[arg(long, value_name = "URL", conflicts_with = "drive_url")]
    pub notion_url: Option<String>,

    /// The learning goal, e.g. "I want to learn python basics in 3 days"
    #[arg(long, short = 'g', value_name = "TEXT")]
    pub goal: String,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The secondary integration selected by the flags, if any.
    pub fn secondary(&self) -> Option<Integration> {
        if let Some(url) = &self.drive_url {
            Some(Integration::Drive(url.clone()))
        } else {
            self.notion_url.clone().map(Integration::Notion)
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("learnpath").chain(args.iter().copied()))
    }

    #[test]
    fn goal_is_required() {
        assert!(parse(&["--youtube-url", "http://x/mcp"]).is_err());
        assert!(parse(&["--youtube-url", "http://x/mcp", "--goal", "learn rust"]).is_ok());
    }

    #[test]
    fn drive_and_notion_flags_are_mutually_exclusive() {
        let err = parse(&[
            "--youtube-url", "http://x/mcp",
            "--goal", "g",
            "--drive-url", "http://d/mcp",
            "--notion-url", "http://n/mcp",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn drive_flag_selects_the_drive_integration() {
        let cli = parse(&[
            "--youtube-url", "http://x/mcp",
            "--goal", "g",
            "--drive-url", "http://d/mcp",
        ])
        .unwrap();
        assert!(matches!(cli.secondary(), Some(Integration::Drive(u)) if u == "http://d/mcp"));
    }

    #[test]
    fn notion_flag_selects_the_notion_integration() {
        let cli = parse(&[
            "--youtube-url", "http://x/mcp",
            "--goal", "g",
            "--notion-url", "http://n/mcp",
        ])
        .unwrap();
        assert!(matches!(cli.secondary(), Some(Integration::Notion(u)) if u == "http://n/mcp"));
    }

    #[test]
    fn no_secondary_flags_means_no_integration() {
        let cli = parse(&["--youtube-url", "http://x/mcp", "--goal", "g"]).unwrap();
        assert!(cli.secondary().is_none());
    }
}
