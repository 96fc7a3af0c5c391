//! On-disk memoization of PuppetDB answers.
//!
//! One JSON file per (server, query) pair:
//! `<cache_dir>/puppet-ghostbuster.<server>_<query>.cache`, where `<server>`
//! is the PuppetDB URL with `:` and `/` replaced by `_`.
//!
//! There is no TTL and no locking. A cache file lives until an operator
//! deletes it (or runs with `--clear-cache`), and a file that no longer
//! decodes is reported as corruption rather than silently refetched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GhostbusterError, GhostbusterResult, IoResultExt};

/// Prefix shared by every cache file.
pub const CACHE_PREFIX: &str = "puppet-ghostbuster";

/// Query names persisted by the inventory client.
pub const CLASSES_QUERY: &str = "classes";
pub const FILES_QUERY: &str = "files";

/// Replaces `:` and `/` so a URL can be embedded in a file name.
pub fn sanitize_identity(identity: &str) -> String {
    identity.replace([':', '/'], "_")
}

/// Cache files for a single inventory server.
#[derive(Debug, Clone)]
pub struct InventoryCache {
    dir: PathBuf,
    server: String,
}

impl InventoryCache {
    pub fn new(dir: impl Into<PathBuf>, server_identity: &str) -> Self {
        Self {
            dir: dir.into(),
            server: sanitize_identity(server_identity),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing the given query name.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}_{}.cache", CACHE_PREFIX, self.server, name))
    }

    /// Returns the cached value, or `None` when nothing was stored yet.
    pub fn get(&self, name: &str) -> GhostbusterResult<Option<Value>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path).with_path(&path)?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| GhostbusterError::cache_corruption(&path, e.to_string()))
    }

    /// Stores `value`, replacing any previous content, and hands it back.
    pub fn put(&self, name: &str, value: Value) -> GhostbusterResult<Value> {
        let path = self.path(name);
        let text = serde_json::to_string(&value)
            .map_err(|e| GhostbusterError::cache_corruption(&path, e.to_string()))?;
        fs::write(&path, text).with_path(&path)?;
        Ok(value)
    }

    /// Typed `get`. A value of the wrong shape counts as corruption.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> GhostbusterResult<Option<T>> {
        match self.get(name)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| GhostbusterError::cache_corruption(self.path(name), e.to_string())),
            None => Ok(None),
        }
    }

    /// Typed `put`.
    pub fn put_as<T: Serialize>(&self, name: &str, value: &T) -> GhostbusterResult<()> {
        let json = serde_json::to_value(value)
            .map_err(|e| GhostbusterError::cache_corruption(self.path(name), e.to_string()))?;
        self.put(name, json)?;
        Ok(())
    }

    /// Deletes the files for the given query names. Returns how many existed.
    pub fn clear(&self, names: &[&str]) -> GhostbusterResult<usize> {
        let mut removed = 0;
        for name in names {
            let path = self.path(name);
            if path.exists() {
                fs::remove_file(&path).with_path(&path)?;
                tracing::info!(path = %path.display(), "removed cache file");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
