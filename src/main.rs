pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod command;
pub mod config;
pub mod event;
pub mod feed;
pub mod guard;
pub mod profile;
pub mod ui;

use app::App;
use clap::Parser;
use cli::{Cli, CliCommand};
use event::EventHandler;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Initialize tracing (logs to stderr if RUST_LOG is set).
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        // No subcommand or explicit `tui` → launch the interactive TUI.
        None | Some(CliCommand::Tui) => run_tui().await,
        // All other subcommands → non-interactive JSONL output.
        Some(cmd) => cli::run_command(cmd).await,
    }
}

/// Launch the interactive TUI.
async fn run_tui() -> color_eyre::Result<()> {
    let (config, api, session) = cli::build_context()?;

    match session.get_session() {
        Some(s) => tracing::info!(name = %s.display_name, "restored session"),
        None => tracing::info!("no stored session"),
    }

    let events = EventHandler::new(config.tick_rate_fps);
    let terminal = ratatui::init();
    let result = App::new(config, api, session, events).run(terminal).await;
    ratatui::restore();
    result
}
