//! In-memory record of one discovered extension.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::manifest::ExtensionManifest;

/// One discovered, installable extension.
///
/// Identity (`name`, `directory`, `main`, `dependencies`) is fixed at
/// discovery. `options` and `is_registered` are filled in later by the
/// registry and the activation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    name: String,
    directory: PathBuf,
    main: String,
    dependencies: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
    /// Host-supplied configuration for this extension, if any.
    #[serde(default)]
    pub options: Option<serde_json::Value>,
    /// Set once the entry point has been invoked successfully.
    #[serde(default)]
    pub is_registered: bool,
}

impl ExtensionDescriptor {
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        main: impl Into<String>,
        dependencies: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            main: main.into(),
            dependencies,
            metadata: BTreeMap::new(),
            options: None,
            is_registered: false,
        }
    }

    /// Build a descriptor from a manifest found in `directory`.
    pub fn from_manifest(manifest: ExtensionManifest, directory: impl Into<PathBuf>) -> Self {
        let ExtensionManifest {
            name,
            main,
            dependencies,
            metadata,
        } = manifest;
        Self {
            metadata,
            ..Self::new(name, directory, main, dependencies.unwrap_or_default())
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the extension's root folder.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Entry point path relative to [`directory`](Self::directory).
    pub fn main(&self) -> &str {
        &self.main
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Extra keys declared in the manifest.
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}
