//! Extension registry: the facade hosts talk to.
//!
//! [`ExtensionRegistry::init`] discovers extensions under the configured
//! root, attaches per-extension options, and activates either the configured
//! list or everything it found. Afterwards [`ExtensionRegistry::extensions`]
//! is the live set of active extensions.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::activation::{ActivationEngine, ActivationReport, IntoExtensionNames};
use crate::cache::DiscoveryCache;
use crate::catalog::ExtensionCatalog;
use crate::config::RegistryOptions;
use crate::descriptor::ExtensionDescriptor;
use crate::error::Result;
use crate::events::ExtensionEvent;
use crate::loader::EntryPointLoader;
use crate::scanner::ManifestScanner;

/// Where a registry is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    Scanning,
    Activating,
    Ready,
}

/// Discovers and activates extensions for a host of type `H`.
pub struct ExtensionRegistry<H: ?Sized> {
    options: RegistryOptions,
    host: Arc<H>,
    catalog: ExtensionCatalog,
    engine: ActivationEngine<H>,
    available: Vec<ExtensionDescriptor>,
    state: RegistryState,
}

impl<H: ?Sized> ExtensionRegistry<H> {
    /// Create a registry backed by the process-wide discovery cache.
    pub fn new(
        host: Arc<H>,
        options: RegistryOptions,
        loader: Arc<dyn EntryPointLoader<H>>,
    ) -> Self {
        Self::with_cache(host, options, loader, DiscoveryCache::process_wide())
    }

    /// Create a registry backed by the given discovery cache.
    pub fn with_cache(
        host: Arc<H>,
        options: RegistryOptions,
        loader: Arc<dyn EntryPointLoader<H>>,
        cache: Arc<DiscoveryCache>,
    ) -> Self {
        let scanner = ManifestScanner::new(options.scan.clone());
        let engine = ActivationEngine::new(loader, options.root_directory.clone());
        Self {
            catalog: ExtensionCatalog::new(scanner, cache),
            engine,
            host,
            options,
            available: Vec::new(),
            state: RegistryState::Uninitialized,
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Discover, configure and activate extensions.
    ///
    /// Fails only when discovery fails, in which case the registry is left
    /// `Uninitialized`. Individual activation failures are logged and
    /// reported but never turned into an error.
    ///
    /// Calling this again scans again unless the cache is enabled, and
    /// re-runs activation for every selected extension; entry points are
    /// not protected against being invoked twice.
    pub async fn init(&mut self) -> Result<ActivationReport> {
        self.state = RegistryState::Scanning;
        let discovered = self
            .catalog
            .find_available(
                &self.options.root_directory,
                self.options.cache_available_extensions,
            )
            .await;
        let mut discovered = match discovered {
            Ok(list) => list,
            Err(e) => {
                self.state = RegistryState::Uninitialized;
                return Err(e);
            }
        };

        for descriptor in &mut discovered {
            descriptor.options = self.options.options_for(descriptor.name()).cloned();
        }
        self.available = discovered;

        let selected: Vec<String> = match self.options.explicit_extensions() {
            Some(names) => names.to_vec(),
            None => self
                .available
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
        };

        self.state = RegistryState::Activating;
        let report = self.use_extensions(selected);
        self.state = RegistryState::Ready;

        tracing::info!(
            activated = report.activated.len(),
            failed = report.failed.len(),
            missing = report.missing.len(),
            "Extensions loaded"
        );
        Ok(report)
    }

    /// Activate extensions by name against the current catalog.
    pub fn use_extensions(&mut self, names: impl IntoExtensionNames) -> ActivationReport {
        self.engine
            .activate(&*self.host, &mut self.available, names)
    }

    /// Every discovered extension, in activation order.
    pub fn available_extensions(&self) -> &[ExtensionDescriptor] {
        &self.available
    }

    pub fn available_extensions_mut(&mut self) -> &mut [ExtensionDescriptor] {
        &mut self.available
    }

    /// Extensions that are currently active.
    ///
    /// Computed from the catalog on every call.
    pub fn extensions(&self) -> Vec<&ExtensionDescriptor> {
        self.available.iter().filter(|d| d.is_registered).collect()
    }

    /// Look up a discovered extension by name.
    pub fn get(&self, name: &str) -> Option<&ExtensionDescriptor> {
        self.available.iter().find(|d| d.name() == name)
    }

    /// Call `listener` each time an extension is activated.
    pub fn on_extension_registered<F>(&mut self, listener: F)
    where
        F: Fn(&ExtensionDescriptor) + Send + Sync + 'static,
    {
        self.engine.events_mut().on_extension_registered(listener);
    }

    /// Receive every activation event emitted after this call.
    ///
    /// The channel is unbounded, so events from a batch of any size are all
    /// delivered even when the receiver is drained after `init` returns.
    pub fn subscribe(&self) -> UnboundedReceiver<ExtensionEvent> {
        self.engine.events().subscribe()
    }
}

impl<H: ?Sized> std::fmt::Debug for ExtensionRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("available", &self.available.len())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
