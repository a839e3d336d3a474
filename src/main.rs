mod cli;
mod progress;

use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::Cli;
use learnpath_core::{generate_plan_sync, Milestone, PlanRequest};
use progress::{ProgressState, Section};

// The driver owns its event loop (one fresh runtime per invocation), so
// main stays synchronous instead of using #[tokio::main].
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.goal.trim().is_empty() {
        anyhow::bail!("please enter a learning goal");
    }

    let config = learnpath_config::load(cli.config.as_deref())?;

    let request = PlanRequest {
        youtube_url: cli.youtube_url.clone(),
        secondary: cli.secondary(),
        goal: cli.goal.clone(),
    };

    let state = Arc::new(Mutex::new(ProgressState::default()));
    state.lock().unwrap().start();

    let display = Arc::clone(&state);
    let sink = move |milestone: &Milestone| {
        let mut state = display.lock().unwrap();
        let section_before = state.section;
        state.apply(milestone);
        render_progress(&state, section_before != state.section);
    };
    let sink: &(dyn Fn(&Milestone) + Send + Sync) = &sink;

    match generate_plan_sync(&config, &request, Some(sink)) {
        Ok(plan) => {
            println!("\n📚 Your Learning Path\n");
            println!("{plan}");
            Ok(())
        }
        Err(e) => {
            // Reset so the session could start a fresh invocation.
            state.lock().unwrap().is_generating = false;
            eprintln!("An error occurred: {e}");
            eprintln!("Please check your URLs and try again.");
            Err(e.into())
        }
    }
}

/// Print one progress line for the updated state.
fn render_progress(state: &ProgressState, section_changed: bool) {
    if section_changed && state.section != Section::Complete {
        println!("{}", state.section);
    }
    if !state.is_generating && state.fraction_complete >= 1.0 {
        println!("All steps completed! 🎉");
    } else {
        let prefix = if state.fraction_complete >= 0.5 { "✓" } else { "→" };
        println!("{prefix} {}", state.current_step);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
