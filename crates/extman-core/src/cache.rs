//! Discovery result cache shared between catalogs.
//!
//! The cache remembers the most recent ordered discovery result. It is not
//! keyed by root directory: a catalog that asks for a cached result gets
//! whatever the last scan produced, wherever that scan started. Entries are
//! never evicted; a later scan simply overwrites the slot.
//!
//! The lock only guards the slot itself. Two registries discovering at the
//! same time both scan, and the last one to finish wins the slot.

use std::sync::{Arc, OnceLock, RwLock};

use crate::descriptor::ExtensionDescriptor;

/// Holds the last ordered descriptor list produced by a scan.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    slot: RwLock<Option<Arc<Vec<ExtensionDescriptor>>>>,
}

static PROCESS_WIDE: OnceLock<Arc<DiscoveryCache>> = OnceLock::new();

impl DiscoveryCache {
    /// Create a fresh, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every registry that was not given its own.
    pub fn process_wide() -> Arc<DiscoveryCache> {
        Arc::clone(PROCESS_WIDE.get_or_init(|| Arc::new(DiscoveryCache::new())))
    }

    /// Return a copy of the cached list, if a scan has populated it.
    pub fn get(&self) -> Option<Vec<ExtensionDescriptor>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|list| list.as_ref().clone())
    }

    /// Replace the cached list.
    pub fn store(&self, descriptors: &[ExtensionDescriptor]) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(descriptors.to_vec()));
    }

    pub fn is_populated(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
