//! Typed error handling for ghostbuster.
//!
//! Every variant here is fatal for the run. Symlinked manifests are the only
//! non-fatal condition and are reported through `tracing` instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ghostbuster operations.
#[derive(Error, Debug)]
pub enum GhostbusterError {
    /// I/O error when reading or writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Bad ignore rule, config file or TLS credential
    #[error("Config error{}: {message}", display_path(.path))]
    Config {
        path: Option<PathBuf>,
        message: String,
    },

    /// A cache file exists but cannot be decoded. Never repaired automatically.
    #[error("Corrupt cache file {path}: {message} (delete it to refetch)")]
    CacheCorruption { path: PathBuf, message: String },

    /// PuppetDB could not be reached, refused us, or sent garbage
    #[error("PuppetDB at {server} unavailable: {message}")]
    InventoryUnavailable { server: String, message: String },
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

impl GhostbusterError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a config error tied to a file.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Create a config error that is not tied to any file.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::Config {
            path: None,
            message: message.into(),
        }
    }

    /// Create a cache corruption error.
    pub fn cache_corruption(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CacheCorruption {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an inventory error for the given server.
    pub fn unavailable(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InventoryUnavailable {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from talking to PuppetDB.
    pub fn is_inventory(&self) -> bool {
        matches!(self, Self::InventoryUnavailable { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Config { path, .. } => path.as_ref(),
            Self::CacheCorruption { path, .. } => Some(path),
            Self::InventoryUnavailable { .. } => None,
        }
    }
}

/// Convenience type alias for ghostbuster results.
pub type GhostbusterResult<T> = Result<T, GhostbusterError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> GhostbusterResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> GhostbusterResult<T> {
        self.map_err(|e| GhostbusterError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_path() {
        let err = GhostbusterError::io(
            "/modules/foo/manifests/init.pp",
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, GhostbusterError::Io { .. }));
        assert_eq!(
            err.path(),
            Some(&PathBuf::from("/modules/foo/manifests/init.pp"))
        );
        assert!(err.to_string().contains("init.pp"));
    }

    #[test]
    fn test_config_error_display() {
        let with_file = GhostbusterError::config("/m/.ghostbusterignore", "bad rule");
        assert_eq!(
            with_file.to_string(),
            "Config error at /m/.ghostbusterignore: bad rule"
        );

        let bare = GhostbusterError::invalid_config("no certname");
        assert_eq!(bare.to_string(), "Config error: no certname");
        assert!(bare.path().is_none());
    }

    #[test]
    fn test_cache_corruption_tells_operator_what_to_do() {
        let err = GhostbusterError::cache_corruption("/var/tmp/x.cache", "expected value");
        assert!(err.to_string().contains("delete it"));
        assert!(!err.is_inventory());
    }

    #[test]
    fn test_inventory_error() {
        let err = GhostbusterError::unavailable("https://puppet:8081", "connection refused");
        assert!(err.is_inventory());
        assert!(err.to_string().contains("https://puppet:8081"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let mapped = result.with_path("/missing/init.pp");
        assert!(matches!(mapped, Err(GhostbusterError::Io { .. })));
    }
}
