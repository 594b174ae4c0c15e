//! Per-extension activation with failure isolation.
//!
//! Each requested name is activated in list order. A name that cannot be
//! found, an entry point that fails to load, returns an error or panics is
//! logged and skipped; the rest of the batch still runs. Nothing here is
//! retried.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::descriptor::ExtensionDescriptor;
use crate::events::{ExtensionEvent, ExtensionEvents};
use crate::loader::{BoxError, EntryPointLoader};

/// Why a single extension failed to activate.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("extension '{name}' not found in folder {root}")]
    NotFound { name: String, root: PathBuf },

    #[error("failed to load entry point of extension '{name}'")]
    Load {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("entry point of extension '{name}' failed")]
    EntryPoint {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("entry point of extension '{name}' panicked: {message}")]
    Panicked { name: String, message: String },
}

/// Outcome of one activation batch.
///
/// Informational only; activation failures are never returned as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Names whose entry point ran successfully, in order.
    pub activated: Vec<String>,
    /// Names whose entry point could not be loaded or failed.
    pub failed: Vec<String>,
    /// Names with no matching descriptor.
    pub missing: Vec<String>,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.missing.is_empty()
    }
}

/// Accepted shapes for "which extensions to activate".
pub trait IntoExtensionNames {
    fn into_extension_names(self) -> Vec<String>;
}

impl IntoExtensionNames for &str {
    fn into_extension_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoExtensionNames for String {
    fn into_extension_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoExtensionNames for &String {
    fn into_extension_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoExtensionNames for Vec<String> {
    fn into_extension_names(self) -> Vec<String> {
        self
    }
}

impl IntoExtensionNames for &Vec<String> {
    fn into_extension_names(self) -> Vec<String> {
        self.clone()
    }
}

impl IntoExtensionNames for Vec<&str> {
    fn into_extension_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoExtensionNames for &[String] {
    fn into_extension_names(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoExtensionNames for &[&str] {
    fn into_extension_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoExtensionNames for [&str; N] {
    fn into_extension_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoExtensionNames for &ExtensionDescriptor {
    fn into_extension_names(self) -> Vec<String> {
        vec![self.name().to_string()]
    }
}

/// Loads and invokes extension entry points.
pub struct ActivationEngine<H: ?Sized> {
    loader: Arc<dyn EntryPointLoader<H>>,
    root_directory: PathBuf,
    events: ExtensionEvents,
}

impl<H: ?Sized> ActivationEngine<H> {
    /// `root_directory` is only used to say where a missing extension was
    /// looked for.
    pub fn new(loader: Arc<dyn EntryPointLoader<H>>, root_directory: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            root_directory: root_directory.into(),
            events: ExtensionEvents::new(),
        }
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    pub fn events(&self) -> &ExtensionEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut ExtensionEvents {
        &mut self.events
    }

    /// Activate every named extension found in `catalog`, in order.
    ///
    /// Empty names are skipped without a lookup. The call returns once each
    /// entry point has returned; work an extension defers is not awaited.
    pub fn activate(
        &self,
        host: &H,
        catalog: &mut [ExtensionDescriptor],
        names: impl IntoExtensionNames,
    ) -> ActivationReport {
        let mut report = ActivationReport::default();

        for name in names.into_extension_names() {
            if name.is_empty() {
                continue;
            }
            match self.activate_one(host, catalog, &name) {
                Ok(()) => report.activated.push(name),
                Err(err) => {
                    tracing::error!(
                        extension = %name,
                        error = %error_chain(&err),
                        "Error when loading extension"
                    );
                    match err {
                        ActivationError::NotFound { .. } => report.missing.push(name),
                        _ => report.failed.push(name),
                    }
                }
            }
        }

        report
    }

    /// Activate a single extension, returning why it failed.
    ///
    /// On success the descriptor is flagged registered and an
    /// [`ExtensionEvent::Registered`] is emitted before returning.
    pub fn activate_one(
        &self,
        host: &H,
        catalog: &mut [ExtensionDescriptor],
        name: &str,
    ) -> Result<(), ActivationError> {
        tracing::info!(extension = %name, "Using extension");

        let descriptor = catalog
            .iter_mut()
            .find(|d| d.name() == name)
            .ok_or_else(|| ActivationError::NotFound {
                name: name.to_string(),
                root: self.root_directory.clone(),
            })?;

        let entry = self
            .loader
            .load(descriptor.directory(), descriptor.main())
            .map_err(|source| ActivationError::Load {
                name: name.to_string(),
                source,
            })?;

        let current: &ExtensionDescriptor = descriptor;
        match panic::catch_unwind(AssertUnwindSafe(|| entry.call(host, current))) {
            Ok(Ok(())) => {}
            Ok(Err(source)) => {
                return Err(ActivationError::EntryPoint {
                    name: name.to_string(),
                    source,
                });
            }
            Err(payload) => {
                return Err(ActivationError::Panicked {
                    name: name.to_string(),
                    message: panic_message(payload.as_ref()),
                });
            }
        }

        descriptor.is_registered = true;
        self.events
            .emit(ExtensionEvent::Registered(descriptor.clone()));
        Ok(())
    }
}

impl<H: ?Sized> std::fmt::Debug for ActivationEngine<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationEngine")
            .field("root_directory", &self.root_directory)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Render an error and all of its sources on one line.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
