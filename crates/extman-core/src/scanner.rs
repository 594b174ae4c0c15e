//! Recursive manifest discovery.
//!
//! The walk is depth-first. Every subdirectory is handed to its own tokio
//! task and the parent awaits all of them before reporting upward, so
//! siblings are listed concurrently while each level still returns one
//! aggregated list.
//!
//! Failure handling is asymmetric: if the root cannot be listed the scan
//! fails, but a nested directory that cannot be listed is logged and simply
//! contributes nothing.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::MANIFEST_MARKER;
use crate::error::{Error, Result};

/// Folder name used by package managers for nested dependency bundles.
pub const DEFAULT_NESTED_PACKAGES_DIR: &str = "node_modules";

/// Naming conventions the scanner matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Substring a file name must contain to count as a manifest.
    pub manifest_marker: String,
    /// Package folder that is not descended into a second time.
    ///
    /// Once the walk is inside such a folder, any further folder with this
    /// name is skipped. Extensions that bundle the host as a dependency
    /// would otherwise be discovered twice.
    pub nested_packages_dir: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            manifest_marker: MANIFEST_MARKER.to_string(),
            nested_packages_dir: DEFAULT_NESTED_PACKAGES_DIR.to_string(),
        }
    }
}

/// Walks a directory tree collecting manifest file paths.
#[derive(Debug, Clone, Default)]
pub struct ManifestScanner {
    options: Arc<ScanOptions>,
}

type WalkFuture = Pin<Box<dyn Future<Output = io::Result<Vec<PathBuf>>> + Send>>;

enum Slot {
    Manifest(PathBuf),
    Subtree(PathBuf, JoinHandle<io::Result<Vec<PathBuf>>>),
}

impl ManifestScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Collect every manifest reachable from `root`.
    ///
    /// Entries are visited in file-name order and results are aggregated in
    /// that order, so repeated scans of an unchanged tree agree.
    pub async fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let canonical = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        walk_dir(
            root.to_path_buf(),
            Arc::clone(&self.options),
            Arc::new(vec![canonical]),
        )
        .await
        .map_err(|e| {
            tracing::error!(path = %root.display(), error = %e, "Failed to list scan root");
            Error::scan(root, e)
        })
    }
}

fn walk_dir(dir: PathBuf, options: Arc<ScanOptions>, ancestors: Arc<Vec<PathBuf>>) -> WalkFuture {
    Box::pin(async move {
        let entries = list_dir(&dir).await?;
        let inside_packages = has_segment(&dir, &options.nested_packages_dir);

        let mut slots = Vec::with_capacity(entries.len());
        for path in entries {
            // Follows symlinks; a failed stat falls through to the file check.
            let is_dir = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.is_dir(),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to stat entry");
                    false
                }
            };

            if !is_dir {
                if is_manifest(&path, &options.manifest_marker) {
                    tracing::debug!(path = %path.display(), "Found manifest");
                    slots.push(Slot::Manifest(path));
                }
                continue;
            }

            if inside_packages && has_name(&path, &options.nested_packages_dir) {
                tracing::debug!(path = %path.display(), "Skipping nested package folder");
                continue;
            }

            let canonical = dunce::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if ancestors.contains(&canonical) {
                tracing::debug!(path = %path.display(), "Skipping directory link loop");
                continue;
            }
            let mut chain = Vec::with_capacity(ancestors.len() + 1);
            chain.extend(ancestors.iter().cloned());
            chain.push(canonical);

            let handle = tokio::spawn(walk_dir(
                path.clone(),
                Arc::clone(&options),
                Arc::new(chain),
            ));
            slots.push(Slot::Subtree(path, handle));
        }

        let mut results = Vec::new();
        for slot in slots {
            match slot {
                Slot::Manifest(path) => results.push(path),
                Slot::Subtree(path, handle) => match handle.await {
                    Ok(Ok(found)) => results.extend(found),
                    Ok(Err(e)) => {
                        tracing::error!(path = %path.display(), error = %e, "Failed to list directory");
                    }
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "Directory walk task failed");
                    }
                },
            }
        }
        Ok(results)
    })
}

async fn list_dir(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

fn has_segment(path: &Path, segment: &str) -> bool {
    path.components().any(|c| c.as_os_str() == segment)
}

fn has_name(path: &Path, name: &str) -> bool {
    path.file_name().is_some_and(|n| n == name)
}

fn is_manifest(path: &Path, marker: &str) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().contains(marker))
}
