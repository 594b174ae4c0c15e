//! Turns manifest paths into an ordered list of extension descriptors.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::DiscoveryCache;
use crate::descriptor::ExtensionDescriptor;
use crate::error::{Error, Result};
use crate::manifest::ExtensionManifest;
use crate::scanner::ManifestScanner;

/// Discovers extensions under a root directory.
///
/// Discovery is all-or-nothing: a single manifest that fails to load fails
/// the whole call.
#[derive(Debug, Clone)]
pub struct ExtensionCatalog {
    scanner: ManifestScanner,
    cache: Arc<DiscoveryCache>,
}

impl ExtensionCatalog {
    pub fn new(scanner: ManifestScanner, cache: Arc<DiscoveryCache>) -> Self {
        Self { scanner, cache }
    }

    pub fn cache(&self) -> &Arc<DiscoveryCache> {
        &self.cache
    }

    /// Find every extension under `root`, ordered for activation.
    ///
    /// With `use_cache` set and the cache populated, the cached list is
    /// returned as-is and `root` is not looked at. Every completed scan is
    /// written back to the cache, including scans that bypassed it.
    pub async fn find_available(
        &self,
        root: &Path,
        use_cache: bool,
    ) -> Result<Vec<ExtensionDescriptor>> {
        tracing::info!(root = %root.display(), "Searching for available extensions");

        if use_cache {
            if let Some(cached) = self.cache.get() {
                tracing::info!(count = cached.len(), "Loading extensions from cache");
                return Ok(cached);
            }
        }

        let root = dunce::canonicalize(root).map_err(|e| Error::scan(root, e))?;
        let manifests = self.scanner.scan(&root).await?;
        tracing::info!(count = manifests.len(), "Found extensions");

        let mut descriptors = Vec::with_capacity(manifests.len());
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for manifest_path in manifests {
            let manifest = ExtensionManifest::load(&manifest_path).await?;
            if let Some(first) = seen.get(&manifest.name) {
                return Err(Error::DuplicateExtension {
                    name: manifest.name,
                    first: first.clone(),
                    second: manifest_path,
                });
            }
            seen.insert(manifest.name.clone(), manifest_path.clone());

            let directory = manifest_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.clone());
            descriptors.push(ExtensionDescriptor::from_manifest(manifest, directory));
        }

        sort_by_dependency_count(&mut descriptors);
        self.cache.store(&descriptors);
        Ok(descriptors)
    }
}

/// Order descriptors so that those declaring fewer dependencies come first.
///
/// The sort is stable: equal counts keep their discovery order. This is a
/// heuristic, not a dependency-graph solve; a chain of extensions with the
/// same dependency count is not reordered.
pub fn sort_by_dependency_count(descriptors: &mut [ExtensionDescriptor]) {
    descriptors.sort_by_key(|d| d.dependencies().len());
}
