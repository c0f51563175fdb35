//! Binary entrypoint for the `altq` tools.
use std::{path::PathBuf, process};

use altq::{Result, grid, replay, show};
use altq_server::Settings;
use clap::{Parser, Subcommand};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "altq", about = "Most-recently-used tab switcher tools", version)]
/// Command-line interface for the `altq` binary.
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the settings file (defaults to ~/.altq/settings.ron)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Print the packed grid and score table for a viewport.
    Grid {
        /// Number of items.
        count: usize,
        /// Viewport width.
        width: f64,
        /// Viewport height.
        height: f64,
    },
    /// Summarise a stored cache state file.
    Show {
        /// Path to the JSON state file.
        state: PathBuf,
    },
    /// Replay a RON script of host mutations, events and view requests.
    Replay {
        /// Path to the script.
        script: PathBuf,
        /// Load and persist state at this path (overrides the settings file)
        #[arg(long, value_name = "PATH")]
        state: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);
    match dispatch(cli).await {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("altq: {e}");
            process::exit(1);
        }
    }
}

/// Run the selected command, returning what it prints.
async fn dispatch(cli: Cli) -> Result<String> {
    let settings = Settings::load(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");
    match cli.command {
        Command::Grid {
            count,
            width,
            height,
        } => grid::render(count, width, height),
        Command::Show { state } => {
            let loaded = show::load(&state).await?;
            Ok(show::render(&loaded, settings.max_snapshots_per_window))
        }
        Command::Replay { script, state } => {
            let parsed = replay::Script::load(&script)?;
            let state_path = state.or_else(|| settings.state_path.clone());
            replay::run(&parsed, &settings, state_path.as_deref()).await
        }
    }
}
