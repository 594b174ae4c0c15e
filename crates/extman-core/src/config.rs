//! Registry options.
//!
//! Options are usually embedded in the host's own configuration, but can also
//! be loaded from a standalone TOML, JSON or YAML document:
//!
//! ```toml
//! root_directory = "/opt/reports"
//! cache_available_extensions = true
//! extensions = ["templates", "pdf-export"]
//!
//! [scan]
//! nested_packages_dir = "node_modules"
//!
//! # Any other table is handed to the extension with the same name.
//! [pdf-export]
//! margin = 10
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::DocumentFormat;
use crate::scanner::ScanOptions;

/// Everything an [`ExtensionRegistry`](crate::ExtensionRegistry) needs to run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RegistryOptions {
    /// Directory scanned for extension manifests.
    #[serde(default)]
    pub root_directory: PathBuf,
    /// Reuse the last discovery result instead of scanning again.
    #[serde(default)]
    pub cache_available_extensions: bool,
    /// Extensions to activate. Absent or empty activates everything found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Manifest and package folder naming.
    #[serde(default)]
    pub scan: ScanOptions,
    /// Per-extension options keyed by extension name.
    #[serde(default, flatten)]
    pub extension_options: HashMap<String, serde_json::Value>,
}

impl RegistryOptions {
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self {
            root_directory: root_directory.into(),
            ..Self::default()
        }
    }

    /// Load options from a file, detecting the format from its extension.
    ///
    /// A relative `root_directory` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| Error::ConfigParse {
            path: path.to_path_buf(),
            format: "unknown".to_string(),
            message: "expected a .toml, .json, .yaml or .yml file".to_string(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut options: Self = format.parse(&content).map_err(|message| Error::ConfigParse {
            path: path.to_path_buf(),
            format: format.label().to_string(),
            message,
        })?;

        if options.root_directory.is_relative() {
            if let Some(base) = path.parent() {
                options.root_directory = base.join(&options.root_directory);
            }
        }
        Ok(options)
    }

    pub fn with_root(mut self, root_directory: impl Into<PathBuf>) -> Self {
        self.root_directory = root_directory.into();
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_available_extensions = enabled;
        self
    }

    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_scan(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_extension_options(
        mut self,
        name: impl Into<String>,
        options: serde_json::Value,
    ) -> Self {
        self.extension_options.insert(name.into(), options);
        self
    }

    /// Options configured for the extension called `name`.
    pub fn options_for(&self, name: &str) -> Option<&serde_json::Value> {
        self.extension_options.get(name)
    }

    /// The explicit activation list, if one is configured and non-empty.
    pub fn explicit_extensions(&self) -> Option<&[String]> {
        self.extensions.as_deref().filter(|names| !names.is_empty())
    }
}
