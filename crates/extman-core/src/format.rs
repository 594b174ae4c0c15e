//! Format detection for manifest and options documents.

use std::path::Path;

use serde::de::DeserializeOwned;

/// Serialization format of a document on disk, detected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    ///
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    /// Deserialize `content` in this format.
    ///
    /// The error is rendered to a string so callers can attach the path.
    pub fn parse<T: DeserializeOwned>(self, content: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("extman.config.toml", Some(DocumentFormat::Toml))]
    #[case("extman.config.json", Some(DocumentFormat::Json))]
    #[case("extman.config.yaml", Some(DocumentFormat::Yaml))]
    #[case("extman.config.YML", Some(DocumentFormat::Yaml))]
    #[case("extman.config.js", None)]
    #[case("extman.config", None)]
    fn test_detects_format_from_extension(
        #[case] file: &str,
        #[case] expected: Option<DocumentFormat>,
    ) {
        assert_eq!(DocumentFormat::from_path(Path::new(file)), expected);
    }

    #[test]
    fn test_parse_error_is_rendered() {
        let err = DocumentFormat::Json
            .parse::<serde_json::Value>("{ not json")
            .unwrap_err();
        assert!(!err.is_empty());
    }
}
