//! Extension discovery and activation for host applications.
//!
//! Extensions are folders containing a manifest file named
//! [`MANIFEST_MARKER`] plus a format suffix (`extman.config.toml`,
//! `extman.config.json`, `extman.config.yaml`). An [`ExtensionRegistry`]
//! finds them under a root directory, orders them so extensions with fewer
//! dependencies come first, and activates each one by invoking its entry
//! point through an [`EntryPointLoader`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use extman_core::{ExtensionRegistry, RegistryOptions, StaticLoader};
//!
//! struct Host;
//!
//! # async fn run() -> extman_core::Result<()> {
//! let loader = StaticLoader::<Host>::new().with("main.rs", |_host, ext| {
//!     println!("activating {}", ext.name());
//!     Ok(())
//! });
//! let options = RegistryOptions::new("/opt/host/extensions");
//! let mut registry = ExtensionRegistry::new(Arc::new(Host), options, Arc::new(loader));
//! registry.init().await?;
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod format;
pub mod loader;
pub mod logging;
pub mod manifest;
pub mod registry;
pub mod scanner;

/// Base name of extension manifest files.
///
/// A file is a manifest when its name is this marker followed by a
/// supported format suffix.
pub const MANIFEST_MARKER: &str = "extman.config";

pub use activation::{
    ActivationEngine, ActivationError, ActivationReport, IntoExtensionNames, error_chain,
};
pub use cache::DiscoveryCache;
pub use catalog::{ExtensionCatalog, sort_by_dependency_count};
pub use config::RegistryOptions;
pub use descriptor::ExtensionDescriptor;
pub use error::{Error, Result};
pub use events::{ExtensionEvent, ExtensionEvents};
pub use format::DocumentFormat;
pub use loader::{
    BoxError, EntryPoint, EntryPointExit, EntryPointLoader, ProcessLoader, StaticLoader,
    resolve_entry_path,
};
pub use manifest::ExtensionManifest;
pub use registry::{ExtensionRegistry, RegistryState};
pub use scanner::{DEFAULT_NESTED_PACKAGES_DIR, ManifestScanner, ScanOptions};
