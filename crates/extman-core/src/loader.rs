//! Entry-point loading.
//!
//! The activation engine never loads code by itself. It asks an
//! [`EntryPointLoader`] to turn an extension's `directory` and `main` into a
//! callable [`EntryPoint`], then invokes it with the host context and the
//! descriptor. Hosts pick the loader that matches how their extensions ship:
//!
//! - [`StaticLoader`]: entry points compiled into the host, looked up by path.
//! - [`ProcessLoader`]: `main` is an executable run to completion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;

use crate::descriptor::ExtensionDescriptor;

/// Error type returned by loaders and entry points.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Something an extension exposes to be activated.
pub trait EntryPoint<H: ?Sized>: Send + Sync {
    /// Run the extension's activation against `host`.
    fn call(&self, host: &H, descriptor: &ExtensionDescriptor) -> Result<(), BoxError>;
}

impl<H, F> EntryPoint<H> for F
where
    H: ?Sized,
    F: Fn(&H, &ExtensionDescriptor) -> Result<(), BoxError> + Send + Sync,
{
    fn call(&self, host: &H, descriptor: &ExtensionDescriptor) -> Result<(), BoxError> {
        self(host, descriptor)
    }
}

/// Resolves an extension's entry point.
pub trait EntryPointLoader<H: ?Sized>: Send + Sync {
    fn load(&self, directory: &Path, main: &str) -> Result<Arc<dyn EntryPoint<H>>, BoxError>;
}

/// Join `main` onto `directory`.
///
/// Absolute `main` values are forced relative so an extension cannot point
/// its entry point outside its own folder.
pub fn resolve_entry_path(directory: &Path, main: &str) -> PathBuf {
    let main_path = Path::new(main);
    if main_path.has_root() {
        tracing::warn!(
            main,
            directory = %directory.display(),
            "Extension entry point uses an absolute path; resolving it relative to the extension"
        );
        let relative = main.trim_start_matches(['/', '\\']);
        directory.join(relative)
    } else {
        directory.join(main_path)
    }
}

/// In-process table of entry points.
///
/// Lookups try the resolved entry path (`directory/main`) first, then the
/// bare `main` string, so hosts can register either a concrete location or
/// a location-independent key.
pub struct StaticLoader<H: ?Sized> {
    entries: HashMap<PathBuf, Arc<dyn EntryPoint<H>>>,
}

impl<H: ?Sized> StaticLoader<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a function under `key`, replacing any previous entry.
    pub fn register<F>(&mut self, key: impl Into<PathBuf>, entry: F) -> &mut Self
    where
        F: Fn(&H, &ExtensionDescriptor) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Arc::new(entry));
        self
    }

    /// Register an already shared entry point under `key`.
    pub fn register_entry_point(
        &mut self,
        key: impl Into<PathBuf>,
        entry: Arc<dyn EntryPoint<H>>,
    ) -> &mut Self {
        self.entries.insert(key.into(), entry);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, key: impl Into<PathBuf>, entry: F) -> Self
    where
        F: Fn(&H, &ExtensionDescriptor) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.register(key, entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: ?Sized> Default for StaticLoader<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> EntryPointLoader<H> for StaticLoader<H> {
    fn load(&self, directory: &Path, main: &str) -> Result<Arc<dyn EntryPoint<H>>, BoxError> {
        let resolved = resolve_entry_path(directory, main);
        self.entries
            .get(&resolved)
            .or_else(|| self.entries.get(Path::new(main)))
            .cloned()
            .ok_or_else(|| format!("no entry point registered for {}", resolved.display()).into())
    }
}

/// Runs `directory/main` as a child process and waits for it to exit.
///
/// The child runs in the extension directory and receives:
///
/// - `EXTMAN_EXTENSION_NAME`
/// - `EXTMAN_EXTENSION_DIR`
/// - `EXTMAN_EXTENSION_OPTIONS` (JSON, `null` when no options are set)
///
/// Stdout and stderr are inherited. A non-zero exit is an activation error.
///
/// The child is waited on with a blocking call, so activation occupies the
/// calling thread until every entry point exits. On a current-thread tokio
/// runtime nothing else makes progress meanwhile; hosts that need that should
/// run `init` from `spawn_blocking` or a multi-thread runtime.
#[derive(Debug, Clone, Default)]
pub struct ProcessLoader {
    env: Vec<(String, String)>,
}

impl ProcessLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass an extra environment variable to every entry point.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl<H: ?Sized> EntryPointLoader<H> for ProcessLoader {
    fn load(&self, directory: &Path, main: &str) -> Result<Arc<dyn EntryPoint<H>>, BoxError> {
        let program = resolve_entry_path(directory, main);
        if !program.is_file() {
            return Err(format!("entry point not found: {}", program.display()).into());
        }
        Ok(Arc::new(ProcessEntryPoint {
            program,
            working_dir: directory.to_path_buf(),
            env: self.env.clone(),
        }))
    }
}

/// Exit failure of a process entry point.
#[derive(Debug, thiserror::Error)]
#[error("entry point {program} exited unsuccessfully ({status})")]
pub struct EntryPointExit {
    pub program: PathBuf,
    pub status: ExitStatus,
}

struct ProcessEntryPoint {
    program: PathBuf,
    working_dir: PathBuf,
    env: Vec<(String, String)>,
}

impl ProcessEntryPoint {
    /// - Unix: the program is executed directly.
    /// - Windows: `cmd /C "{program}"`, so `.bat`/`.cmd` scripts work.
    fn command(&self) -> Command {
        #[cfg(windows)]
        {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.program);
            c
        }
        #[cfg(not(windows))]
        {
            Command::new(&self.program)
        }
    }
}

impl<H: ?Sized> EntryPoint<H> for ProcessEntryPoint {
    fn call(&self, _host: &H, descriptor: &ExtensionDescriptor) -> Result<(), BoxError> {
        let options = serde_json::to_string(&descriptor.options)?;

        let mut cmd = self.command();
        cmd.current_dir(&self.working_dir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("EXTMAN_EXTENSION_NAME", descriptor.name())
            .env("EXTMAN_EXTENSION_DIR", descriptor.directory())
            .env("EXTMAN_EXTENSION_OPTIONS", options)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::inherit())
            .stderr(std::process::Stdio::inherit());

        let status = cmd.status()?;
        if !status.success() {
            return Err(Box::new(EntryPointExit {
                program: self.program.clone(),
                status,
            }));
        }
        Ok(())
    }
}
