use std::path::PathBuf;

/// Errors that abort extension discovery.
///
/// Activation-time failures never surface here; see
/// [`ActivationError`](crate::activation::ActivationError).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Listing the scan root failed.
    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest file could not be parsed.
    #[error("failed to parse {format} manifest at {path}: {message}")]
    ManifestParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// Manifest file has an extension we cannot decode.
    #[error("unsupported manifest format at {path}")]
    UnsupportedManifestFormat { path: PathBuf },

    /// Manifest parsed but its fields are unusable.
    #[error("invalid manifest at {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// Two manifests declared the same extension name.
    #[error("extension '{name}' declared twice: {first} and {second}")]
    DuplicateExtension {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Registry options file could not be parsed.
    #[error("failed to parse {format} options at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    /// I/O error reading a manifest or options file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn scan(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
