//! Activate command

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use extman_core::{ExtensionRegistry, ProcessLoader, RegistryOptions};

use crate::error::{CliError, Result};

/// Build a registry from flags and/or a config file and run it.
///
/// Only discovery failures are errors; per-extension failures are printed.
pub async fn run_activate(
    root: Option<PathBuf>,
    config: Option<PathBuf>,
    names: Vec<String>,
) -> Result<()> {
    let mut options = match &config {
        Some(path) => RegistryOptions::load(path)?,
        None => match root.clone() {
            Some(root) => RegistryOptions::new(root),
            None => RegistryOptions::new(std::env::current_dir()?),
        },
    };
    if let Some(root) = root {
        options.root_directory = root;
    }
    if !names.is_empty() {
        options.extensions = Some(names);
    }
    if options.root_directory.as_os_str().is_empty() {
        return Err(CliError::user("no root directory configured; pass --root"));
    }

    let loader = ProcessLoader::new().with_env(
        "EXTMAN_ROOT",
        options.root_directory.display().to_string(),
    );
    let mut registry = ExtensionRegistry::new(Arc::new(()), options, Arc::new(loader));
    let report = registry.init().await?;

    for name in &report.activated {
        println!("{} {}", "activated".green().bold(), name);
    }
    for name in &report.failed {
        println!("{} {}", "failed".red().bold(), name);
    }
    for name in &report.missing {
        println!("{} {}", "missing".yellow().bold(), name);
    }

    println!();
    println!(
        "{} {} activated, {} failed, {} missing",
        "=>".blue().bold(),
        report.activated.len(),
        report.failed.len(),
        report.missing.len()
    );
    Ok(())
}
