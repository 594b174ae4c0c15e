//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// extman - Discover and activate extensions under a directory
#[derive(Parser, Debug)]
#[command(name = "extman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List every extension manifest under a directory
    Scan {
        /// Directory to scan
        #[arg(short, long, default_value = ".", env = "EXTMAN_ROOT")]
        root: PathBuf,
    },

    /// Show discovered extensions in activation order
    List {
        /// Directory to scan
        #[arg(short, long, default_value = ".", env = "EXTMAN_ROOT")]
        root: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Discover and activate extensions
    ///
    /// Each extension's `main` is run as a program from its own directory.
    /// Failing extensions are reported but do not change the exit code.
    ///
    /// Examples:
    ///   extman activate --root ./extensions
    ///   extman activate --config extman.toml
    ///   extman activate --root ./extensions templates pdf-export
    Activate {
        /// Directory to scan (overrides the config file)
        #[arg(short, long, env = "EXTMAN_ROOT")]
        root: Option<PathBuf>,

        /// Registry options file (TOML, JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extensions to activate (default: configured list, else all)
        names: Vec<String>,
    },
}
