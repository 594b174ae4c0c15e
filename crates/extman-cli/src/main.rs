//! extman CLI
//!
//! Discovers extension manifests under a directory and activates them.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::{CliError, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    extman_core::logging::init_with_default(default_level)
        .map_err(|e| CliError::user(format!("failed to initialise logging: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cmd).await,
        None => {
            // No command provided - show help hint
            println!("{} extension manager", "extman".green().bold());
            println!();
            println!("Run {} for available commands.", "extman --help".cyan());
            Ok(())
        }
    }
}

async fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Scan { root } => commands::run_scan(&root).await,
        Commands::List { root, json } => commands::run_list(&root, json).await,
        Commands::Activate {
            root,
            config,
            names,
        } => commands::run_activate(root, config, names).await,
    }
}
