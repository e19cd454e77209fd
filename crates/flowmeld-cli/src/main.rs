//! FlowMeld CLI - sign in to FlowMeld and work with your dashboard from the
//! terminal.
//!
//! The session (tokens, theme and accent color) persists between runs in the
//! configured storage backend.

mod commands;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flowmeld_core::{AccentColor, AuthContext, Config, Theme};

#[derive(Parser)]
#[command(name = "flowmeld", version, about = "Your AI-powered orchestrator, in the terminal")]
struct Cli {
    /// API base URL (overrides the config file)
    #[arg(long, env = flowmeld_core::config::BASE_URL_ENV, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with username and password
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget tokens and preferences
    Logout,
    /// Renew the access token now
    Refresh,
    /// Show the signed-in user
    Whoami,
    /// Show session, token and preference details
    Status,
    /// Show or set the theme (toggles when no value is given)
    Theme { theme: Option<Theme> },
    /// Show or set the accent color
    Accent { color: Option<AccentColor> },
    /// Tasks and persona overview
    Dashboard,
    /// List your tasks
    Tasks,
    /// Show your persona
    Persona,
    /// Ask the daily planner for suggestions
    Suggestions,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load()?;
    config.apply_overrides(cli.api_url);
    info!(base_url = %config.base_url(), "FlowMeld CLI starting");

    let context = AuthContext::from_config(&config)?;
    let mut events = context.subscribe();

    let result = match cli.command {
        Command::Login { username } => commands::login(&context, &mut config, username).await,
        Command::Register { username, email } => commands::register(&context, &username, &email).await,
        Command::Logout => commands::logout(&context).await,
        Command::Refresh => commands::refresh(&context).await,
        Command::Whoami => commands::whoami(&context).await,
        Command::Status => commands::status(&context, &config).await,
        Command::Theme { theme } => commands::theme(&context, theme).await,
        Command::Accent { color } => commands::accent(&context, color).await,
        Command::Dashboard => commands::dashboard(&context).await,
        Command::Tasks => commands::tasks(&context).await,
        Command::Persona => commands::persona(&context).await,
        Command::Suggestions => commands::suggestions(&context).await,
    };

    commands::report_navigation(&mut events);
    result
}
