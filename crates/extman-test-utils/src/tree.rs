//! [`ExtensionTree`] builder for extension discovery scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name written by [`ExtensionTree::add_extension`].
pub const MANIFEST_FILE: &str = "extman.config.toml";

/// A temporary extensions root with helper methods for test setup and
/// assertion.
///
/// # Example
///
/// ```rust,no_run
/// use extman_test_utils::ExtensionTree;
///
/// let tree = ExtensionTree::new();
/// tree.add_extension("templates", "templates", &[]);
/// tree.add_extension("pdf", "pdf-export", &["templates"]);
/// tree.assert_file_exists("pdf/extman.config.toml");
/// ```
pub struct ExtensionTree {
    temp_dir: TempDir,
}

impl Default for ExtensionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionTree {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Join `rel` onto the root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a TOML manifest into `rel_dir` with `main = "main.sh"`.
    ///
    /// Returns the manifest path.
    pub fn add_extension(&self, rel_dir: &str, name: &str, deps: &[&str]) -> PathBuf {
        self.add_extension_with_main(rel_dir, name, "main.sh", deps)
    }

    /// Like [`add_extension`](Self::add_extension) with an explicit `main`.
    pub fn add_extension_with_main(
        &self,
        rel_dir: &str,
        name: &str,
        main: &str,
        deps: &[&str],
    ) -> PathBuf {
        let mut manifest = format!("name = \"{name}\"\nmain = \"{main}\"\n");
        if !deps.is_empty() {
            let list = deps
                .iter()
                .map(|d| format!("\"{d}\""))
                .collect::<Vec<_>>()
                .join(", ");
            manifest.push_str(&format!("dependencies = [{list}]\n"));
        }
        self.write_manifest(rel_dir, MANIFEST_FILE, &manifest)
    }

    /// Write a manifest file named `file_name` into `rel_dir` verbatim.
    pub fn write_manifest(&self, rel_dir: &str, file_name: &str, content: &str) -> PathBuf {
        let rel = if rel_dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{rel_dir}/{file_name}")
        };
        self.write_file(&rel, content)
    }

    /// Add an extension whose `main.sh` is an executable shell script
    /// running `body`.
    #[cfg(unix)]
    pub fn add_script_extension(
        &self,
        rel_dir: &str,
        name: &str,
        deps: &[&str],
        body: &str,
    ) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let manifest = self.add_extension(rel_dir, name, deps);
        let script = self.write_file(
            &format!("{rel_dir}/main.sh"),
            &format!("#!/bin/sh\n{body}\n"),
        );
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        manifest
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to the root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.path(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
