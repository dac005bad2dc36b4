//! Statusline - renders a status block from a coding-assistant snapshot on stdin.

use anyhow::{Context, Result};
use clap::Parser;
use statusline_cli::{config, logging, state};
use statusline_core::Layout;
use statusline_types::Snapshot;
use std::io::Write;
use std::path::PathBuf;

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Statusline - model, project, branch, context usage and session time.
#[derive(Parser, Debug)]
#[command(name = "statusline")]
#[command(about = "Render a status block from the JSON snapshot on stdin")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the session store directory
    #[arg(long, value_name = "DIR")]
    sessions_dir: Option<PathBuf>,

    /// Disable colors (also honored via NO_COLOR)
    #[arg(long)]
    no_color: bool,

    /// Where the user message goes: message_first or message_last
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<Layout>,

    /// Enable verbose logging (cache and session activity)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "git=debug" or "session=trace").
    /// Can be specified multiple times. Targets are prefixed with "statusline::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    if let Some(dir) = cli.sessions_dir {
        config.sessions_dir = dir;
    }
    if let Some(layout) = cli.layout {
        config.layout = layout;
    }
    if cli.no_color || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        config.colors = false;
    }

    tracing::debug!(
        target: "statusline::startup",
        "Loaded configuration (sessions: {})",
        config.sessions_dir.display()
    );

    let snapshot: Snapshot =
        serde_json::from_reader(std::io::stdin().lock()).context("Failed to decode input")?;

    let state = AppState::new(config);
    let output = state.render(&snapshot).await;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("Failed to write status line")?;
    stdout.flush()?;

    Ok(())
}
