//! Blocking PuppetDB client with mutual TLS and on-disk caching.
//!
//! `Class` and `File` answers are cached per server (see [`crate::cache`]);
//! per-define counts always hit the network. Nothing is retried: the first
//! failure surfaces as `InventoryUnavailable`.

use reqwest::blocking::Client;
use reqwest::{Certificate, Identity};
use serde_json::json;
use std::collections::HashSet;
use std::fs;

use super::resource::{classes_from_resources, files_from_resources, FileUsage, Resource};
use super::Inventory;
use crate::cache::{InventoryCache, CLASSES_QUERY, FILES_QUERY};
use crate::config::{GhostbusterConfig, TlsCredentials};
use crate::error::{GhostbusterError, GhostbusterResult, IoResultExt};

/// PuppetDB v4 resources endpoint, relative to the server URL.
pub const RESOURCES_ENDPOINT: &str = "/pdb/query/v4/resources";

/// Loads key + certificate into a rustls identity and the CA into a root cert.
fn load_tls(creds: &TlsCredentials) -> GhostbusterResult<(Identity, Certificate)> {
    let mut pem = fs::read(&creds.key).with_path(&creds.key)?;
    pem.push(b'\n');
    pem.extend(fs::read(&creds.cert).with_path(&creds.cert)?);
    let identity = Identity::from_pem(&pem)
        .map_err(|e| GhostbusterError::config(&creds.cert, format!("bad key/cert pair: {}", e)))?;

    let ca_pem = fs::read(&creds.ca).with_path(&creds.ca)?;
    let ca = Certificate::from_pem(&ca_pem)
        .map_err(|e| GhostbusterError::config(&creds.ca, format!("bad CA certificate: {}", e)))?;

    Ok((identity, ca))
}

/// PuppetDB-backed [`Inventory`].
#[derive(Debug)]
pub struct PuppetDbClient {
    server: String,
    http: Client,
    cache: InventoryCache,
}

impl PuppetDbClient {
    /// Builds the HTTP client. Credentials are read here, so a bad path is a
    /// config error before any pass starts.
    pub fn new(config: &GhostbusterConfig) -> GhostbusterResult<Self> {
        let cache = InventoryCache::new(&config.cache_dir, config.server_identity());
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: &GhostbusterConfig, cache: InventoryCache) -> GhostbusterResult<Self> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout());

        if let Some(creds) = config.tls_credentials()? {
            let (identity, ca) = load_tls(&creds)?;
            builder = builder.identity(identity).add_root_certificate(ca);
        }

        let http = builder
            .build()
            .map_err(|e| GhostbusterError::invalid_config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            server: config.server_identity().trim_end_matches('/').to_string(),
            http,
            cache,
        })
    }

    pub fn cache(&self) -> &InventoryCache {
        &self.cache
    }

    fn unavailable(&self, message: impl Into<String>) -> GhostbusterError {
        GhostbusterError::unavailable(&self.server, message)
    }

    /// Runs `["=", "type", <type_name>]` against the resources endpoint.
    pub fn resources_of_type(&self, type_name: &str) -> GhostbusterResult<Vec<Resource>> {
        let query = json!(["=", "type", type_name]).to_string();
        let url = format!("{}{}", self.server, RESOURCES_ENDPOINT);
        tracing::debug!(%url, %query, "querying PuppetDB");

        let resp = self
            .http
            .get(&url)
            .query(&[("query", query.as_str())])
            .send()
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(self.unavailable(format!("HTTP {}: {}", status, body.trim())));
        }

        resp.json::<Vec<Resource>>()
            .map_err(|e| self.unavailable(format!("undecodable response: {}", e)))
    }
}

impl Inventory for PuppetDbClient {
    fn used_classes(&self) -> GhostbusterResult<HashSet<String>> {
        if let Some(cached) = self.cache.get_as::<HashSet<String>>(CLASSES_QUERY)? {
            tracing::debug!(count = cached.len(), "used classes from cache");
            return Ok(cached);
        }

        let classes = classes_from_resources(&self.resources_of_type("Class")?);
        // sorted so the cache file is stable between refreshes
        let mut sorted: Vec<&String> = classes.iter().collect();
        sorted.sort();
        self.cache.put_as(CLASSES_QUERY, &sorted)?;
        Ok(classes)
    }

    fn used_files(&self) -> GhostbusterResult<Vec<FileUsage>> {
        if let Some(cached) = self.cache.get_as::<Vec<(String, bool)>>(FILES_QUERY)? {
            tracing::debug!(count = cached.len(), "used files from cache");
            return Ok(cached
                .into_iter()
                .map(|(source, recursive)| FileUsage::new(source, recursive))
                .collect());
        }

        let files = files_from_resources(&self.resources_of_type("File")?);
        let pairs: Vec<(&str, bool)> = files
            .iter()
            .map(|f| (f.source.as_str(), f.recursive))
            .collect();
        self.cache.put_as(FILES_QUERY, &pairs)?;
        Ok(files)
    }

    fn resource_count(&self, type_name: &str) -> GhostbusterResult<usize> {
        Ok(self.resources_of_type(type_name)?.len())
    }
}
