//! Extension manifest parsing.
//!
//! A manifest is any file whose name contains the manifest marker
//! ([`MANIFEST_MARKER`](crate::MANIFEST_MARKER), `extman.config`). The file
//! extension selects the document format.
//!
//! # Example TOML
//!
//! ```toml
//! name = "pdf-export"
//! main = "bin/activate.sh"
//! dependencies = ["templates"]
//!
//! # Any further keys are kept as descriptor metadata.
//! description = "Render reports to PDF"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::DocumentFormat;

/// Raw manifest document as declared by an extension.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExtensionManifest {
    /// Extension name, unique within a catalog.
    pub name: String,
    /// Entry point path relative to the manifest's directory.
    pub main: String,
    /// Names of other extensions this one depends on.
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    /// Every other declared key, kept verbatim.
    #[serde(default, flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ExtensionManifest {
    /// Parse and validate a manifest from a string in the given format.
    ///
    /// `path` is only used for error reporting.
    pub fn parse(content: &str, format: DocumentFormat, path: &Path) -> Result<Self> {
        let manifest: Self = format
            .parse(content)
            .map_err(|message| Error::ManifestParse {
                path: path.to_path_buf(),
                format: format.label().to_string(),
                message,
            })?;
        manifest.validate(path)?;
        Ok(manifest)
    }

    /// Read, parse and validate the manifest at `path`.
    pub async fn load(path: &Path) -> Result<Self> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            Error::UnsupportedManifestFormat {
                path: path.to_path_buf(),
            }
        })?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io(path, e))?;
        Self::parse(&content, format, path)
    }

    /// Declared dependencies, with absence normalized to empty.
    pub fn dependency_names(&self) -> &[String] {
        self.dependencies.as_deref().unwrap_or_default()
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| Error::InvalidManifest {
            path: path.to_path_buf(),
            reason,
        };

        validate_name(&self.name).map_err(invalid)?;

        if self.main.trim().is_empty() {
            return Err(invalid(format!(
                "extension '{}' must declare a non-empty `main`",
                self.name
            )));
        }

        for dependency in self.dependency_names() {
            if dependency.trim().is_empty() {
                return Err(invalid(format!(
                    "extension '{}' declares an empty dependency name",
                    self.name
                )));
            }
        }

        Ok(())
    }
}

/// Check that `name` can serve as a catalog key.
///
/// Names must be non-empty and free of whitespace and path separators.
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("extension name must not be empty".to_string());
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(format!(
            "extension name '{name}' must not contain whitespace or path separators"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PDF_TOML: &str = r#"
name = "pdf-export"
main = "bin/activate.sh"
dependencies = ["templates", "assets"]
description = "Render reports to PDF"

[defaults]
margin = 10
"#;

    fn manifest_path() -> &'static Path {
        Path::new("/ext/pdf-export/extman.config.toml")
    }

    #[test]
    fn test_parse_toml_manifest() {
        let manifest =
            ExtensionManifest::parse(PDF_TOML, DocumentFormat::Toml, manifest_path()).unwrap();

        assert_eq!(manifest.name, "pdf-export");
        assert_eq!(manifest.main, "bin/activate.sh");
        assert_eq!(manifest.dependency_names(), ["templates", "assets"]);
        assert_eq!(
            manifest.metadata.get("description"),
            Some(&serde_json::json!("Render reports to PDF"))
        );
        assert_eq!(
            manifest.metadata.get("defaults"),
            Some(&serde_json::json!({ "margin": 10 }))
        );
    }

    #[test]
    fn test_parse_json_manifest_without_dependencies() {
        let json = r#"{ "name": "templates", "main": "index.sh" }"#;
        let manifest =
            ExtensionManifest::parse(json, DocumentFormat::Json, manifest_path()).unwrap();

        assert!(manifest.dependencies.is_none());
        assert!(manifest.dependency_names().is_empty());
        assert!(manifest.metadata.is_empty());
    }

    #[test]
    fn test_parse_json_null_dependencies_normalized() {
        let json = r#"{ "name": "templates", "main": "index.sh", "dependencies": null }"#;
        let manifest =
            ExtensionManifest::parse(json, DocumentFormat::Json, manifest_path()).unwrap();

        assert!(manifest.dependency_names().is_empty());
    }

    #[test]
    fn test_parse_yaml_manifest() {
        let yaml = "name: assets\nmain: run.sh\ndependencies:\n  - templates\n";
        let manifest =
            ExtensionManifest::parse(yaml, DocumentFormat::Yaml, manifest_path()).unwrap();

        assert_eq!(manifest.name, "assets");
        assert_eq!(manifest.dependency_names(), ["templates"]);
    }

    #[test]
    fn test_missing_main_is_parse_error() {
        let err = ExtensionManifest::parse("name = \"x\"\n", DocumentFormat::Toml, manifest_path())
            .unwrap_err();
        assert!(
            matches!(err, Error::ManifestParse { ref format, .. } if format == "TOML"),
            "expected ManifestParse, got: {err:?}"
        );
    }

    #[test]
    fn test_empty_main_is_invalid() {
        let err = ExtensionManifest::parse(
            "name = \"x\"\nmain = \"  \"\n",
            DocumentFormat::Toml,
            manifest_path(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
    }

    #[test]
    fn test_empty_dependency_is_invalid() {
        let err = ExtensionManifest::parse(
            "name = \"x\"\nmain = \"run.sh\"\ndependencies = [\"\"]\n",
            DocumentFormat::Toml,
            manifest_path(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("pdf-export").is_ok());
        assert!(validate_name("@scope.name_2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("nested/name").is_err());
        assert!(validate_name("nested\\name").is_err());
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_extension() {
        let err = ExtensionManifest::load(Path::new("/ext/a/extman.config.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedManifestFormat { .. }));
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("extman.config.toml");
        std::fs::write(&path, PDF_TOML).unwrap();

        let manifest = ExtensionManifest::load(&path).await.unwrap();
        assert_eq!(manifest.name, "pdf-export");
    }
}
