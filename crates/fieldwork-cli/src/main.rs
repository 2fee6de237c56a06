//! Fieldwork CLI - field inspection client for the works monitoring API
//!
//! Submits inspections directly and keeps an offline queue for updates that
//! could not be sent, replayed later with `fieldwork sync`.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::clear::run_clear;
use crate::commands::common::{load_config, overrides_from_cli};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::pending::run_pending;
use crate::commands::submit::run_submit;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let overrides = overrides_from_cli(&cli);

    match cli.command {
        Commands::Submit(args) => run_submit(args, &load_config(overrides)?).await,
        Commands::Pending { json } => run_pending(json, &load_config(overrides)?).await,
        Commands::Sync { json } => run_sync(json, &load_config(overrides)?).await,
        Commands::Clear { yes } => run_clear(yes, &load_config(overrides)?).await,
        Commands::Config { command } => run_config(command, overrides),
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "fieldwork=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
