//! Scan command

use std::path::Path;

use colored::Colorize;
use extman_core::ManifestScanner;

use crate::error::Result;

/// Print every manifest found under `root`, one per line.
pub async fn run_scan(root: &Path) -> Result<()> {
    let manifests = ManifestScanner::default().scan(root).await?;

    for manifest in &manifests {
        println!("{}", manifest.display());
    }
    eprintln!(
        "{} {} manifest(s) under {}",
        "=>".blue().bold(),
        manifests.len(),
        root.display()
    );
    Ok(())
}
