//! List command

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use extman_core::{DiscoveryCache, ExtensionCatalog, ManifestScanner};

use crate::error::Result;

/// Print the ordered catalog under `root`.
pub async fn run_list(root: &Path, json: bool) -> Result<()> {
    let catalog = ExtensionCatalog::new(ManifestScanner::default(), Arc::new(DiscoveryCache::new()));
    let extensions = catalog.find_available(root, false).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&extensions)?);
        return Ok(());
    }

    if extensions.is_empty() {
        println!("{}", "No extensions found.".yellow());
        return Ok(());
    }

    println!("{}", "Available Extensions".bold());
    println!();
    for ext in &extensions {
        let deps = if ext.dependencies().is_empty() {
            "no dependencies".dimmed().to_string()
        } else {
            format!("needs {}", ext.dependencies().join(", "))
        };
        println!(
            "  {:<20} {} ({})",
            ext.name().green(),
            deps,
            ext.directory().display()
        );
    }
    println!();
    println!("Total: {} extension(s)", extensions.len());
    Ok(())
}
