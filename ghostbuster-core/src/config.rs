//! Run configuration: PuppetDB endpoint, TLS material, cache location.
//!
//! Built once at startup (defaults, then an optional TOML file, then CLI
//! overrides) and handed to each component by reference.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GhostbusterError, GhostbusterResult, IoResultExt};

/// Default PuppetDB URL, the `puppet` host on the PuppetDB TLS port.
pub const DEFAULT_PUPPETDB_URL: &str = "https://puppet:8081";

/// Default Puppet agent ssldir.
pub const DEFAULT_SSLDIR: &str = "/etc/puppetlabs/puppet/ssl";

/// Default directory holding inventory cache files.
pub const DEFAULT_CACHE_DIR: &str = "/var/tmp";

/// Where the host name is read from when no certname is configured.
const HOSTNAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

/// Puppet certnames are the lower-cased host name.
fn certname_from_hostname(content: &str) -> Option<String> {
    let name = content.lines().next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.to_lowercase())
}

fn system_certname() -> Option<String> {
    HOSTNAME_FILES
        .iter()
        .filter_map(|f| fs::read_to_string(f).ok())
        .find_map(|content| certname_from_hostname(&content))
}

/// Main configuration structure, also the shape of the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GhostbusterConfig {
    /// Base URL of the PuppetDB server.
    pub puppetdb_url: String,
    /// Puppet ssldir used to derive default credential paths.
    pub ssldir: PathBuf,
    /// Certificate name of this host inside the ssldir.
    pub certname: Option<String>,
    /// Client private key (PEM). Overrides the ssldir-derived path.
    pub hostprivkey: Option<PathBuf>,
    /// Client certificate (PEM). Overrides the ssldir-derived path.
    pub hostcert: Option<PathBuf>,
    /// CA certificate (PEM). Overrides the ssldir-derived path.
    pub localcacert: Option<PathBuf>,
    /// Directory for inventory cache files.
    pub cache_dir: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: String,
}

impl Default for GhostbusterConfig {
    fn default() -> Self {
        Self {
            puppetdb_url: DEFAULT_PUPPETDB_URL.to_string(),
            ssldir: PathBuf::from(DEFAULT_SSLDIR),
            certname: None,
            hostprivkey: None,
            hostcert: None,
            localcacert: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            timeout_secs: 30,
            log_level: "warn".to_string(),
        }
    }
}

/// Resolved mutual-TLS credential paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsCredentials {
    pub key: PathBuf,
    pub cert: PathBuf,
    pub ca: PathBuf,
}

impl GhostbusterConfig {
    /// Identity of the inventory server, used to key cache files.
    pub fn server_identity(&self) -> &str {
        &self.puppetdb_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether the server is reached over TLS and thus needs client credentials.
    pub fn uses_tls(&self) -> bool {
        self.puppetdb_url.starts_with("https://")
    }

    /// Configured certname, else the host name as Puppet would default it.
    pub fn effective_certname(&self) -> Option<String> {
        self.certname.clone().or_else(system_certname)
    }

    /// Resolve and check the TLS credential paths.
    ///
    /// Plain `http://` servers need none and yield `Ok(None)`. For `https://`
    /// every file must exist; explicit paths win over the ssldir layout
    /// (`private_keys/<certname>.pem`, `certs/<certname>.pem`, `certs/ca.pem`).
    /// Without a configured certname the host name is used, as Puppet does.
    pub fn tls_credentials(&self) -> GhostbusterResult<Option<TlsCredentials>> {
        if !self.uses_tls() {
            if !self.puppetdb_url.starts_with("http://") {
                return Err(GhostbusterError::invalid_config(format!(
                    "unsupported PuppetDB URL scheme: {}",
                    self.puppetdb_url
                )));
            }
            return Ok(None);
        }

        let derived = |sub: &str, file: String| self.ssldir.join(sub).join(file);
        let certname = if self.hostprivkey.is_some() && self.hostcert.is_some() {
            None
        } else {
            self.effective_certname()
        };
        let from_certname = |sub: &str| -> GhostbusterResult<PathBuf> {
            match &certname {
                Some(name) => Ok(derived(sub, format!("{}.pem", name))),
                None => Err(GhostbusterError::invalid_config(format!(
                    "no certname (set --certname) to locate {} under {}",
                    sub,
                    self.ssldir.display()
                ))),
            }
        };

        let key = match &self.hostprivkey {
            Some(p) => p.clone(),
            None => from_certname("private_keys")?,
        };
        let cert = match &self.hostcert {
            Some(p) => p.clone(),
            None => from_certname("certs")?,
        };
        let ca = self
            .localcacert
            .clone()
            .unwrap_or_else(|| derived("certs", "ca.pem".to_string()));

        for path in [&key, &cert, &ca] {
            if !path.is_file() {
                return Err(GhostbusterError::config(
                    path.clone(),
                    "TLS credential file not found",
                ));
            }
        }

        Ok(Some(TlsCredentials { key, cert, ca }))
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> GhostbusterResult<GhostbusterConfig> {
    let content = fs::read_to_string(path).with_path(path)?;
    toml::from_str(&content).map_err(|e| GhostbusterError::config(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("ghostbuster_config_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_ssldir(certname: &str) -> PathBuf {
        let dir = create_temp_dir("ssldir");
        fs::create_dir_all(dir.join("private_keys")).unwrap();
        fs::create_dir_all(dir.join("certs")).unwrap();
        fs::write(dir.join("private_keys").join(format!("{}.pem", certname)), "k").unwrap();
        fs::write(dir.join("certs").join(format!("{}.pem", certname)), "c").unwrap();
        fs::write(dir.join("certs/ca.pem"), "ca").unwrap();
        dir
    }

    #[test]
    fn test_defaults() {
        let cfg = GhostbusterConfig::default();
        assert_eq!(cfg.puppetdb_url, "https://puppet:8081");
        assert_eq!(cfg.cache_dir, PathBuf::from("/var/tmp"));
        assert_eq!(cfg.log_level, "warn");
        assert!(cfg.uses_tls());
    }

    #[test]
    fn test_load_partial_toml_keeps_defaults() {
        let dir = create_temp_dir("partial");
        let file = dir.join("ghostbuster.toml");
        fs::write(
            &file,
            "puppetdb_url = \"http://puppetdb.example:8080\"\ncertname = \"agent01\"\n",
        )
        .unwrap();

        let cfg = load_config(&file).unwrap();
        assert_eq!(cfg.puppetdb_url, "http://puppetdb.example:8080");
        assert_eq!(cfg.certname.as_deref(), Some("agent01"));
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = create_temp_dir("invalid");
        let file = dir.join("ghostbuster.toml");
        fs::write(&file, "puppetdb_url = [").unwrap();

        let err = load_config(&file).unwrap_err();
        assert!(matches!(err, GhostbusterError::Config { .. }));
    }

    #[test]
    fn test_plain_http_needs_no_credentials() {
        let cfg = GhostbusterConfig {
            puppetdb_url: "http://localhost:8080".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.tls_credentials().unwrap(), None);
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let cfg = GhostbusterConfig {
            puppetdb_url: "ftp://puppet".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.tls_credentials(),
            Err(GhostbusterError::Config { .. })
        ));
    }

    #[test]
    fn test_credentials_derived_from_ssldir() {
        let ssldir = fake_ssldir("agent01");
        let cfg = GhostbusterConfig {
            ssldir: ssldir.clone(),
            certname: Some("agent01".to_string()),
            ..Default::default()
        };

        let creds = cfg.tls_credentials().unwrap().unwrap();
        assert_eq!(creds.key, ssldir.join("private_keys/agent01.pem"));
        assert_eq!(creds.cert, ssldir.join("certs/agent01.pem"));
        assert_eq!(creds.ca, ssldir.join("certs/ca.pem"));
    }

    #[test]
    fn test_certname_from_hostname() {
        assert_eq!(
            certname_from_hostname("Web01.Example.COM\n"),
            Some("web01.example.com".to_string())
        );
        assert_eq!(certname_from_hostname("  \n"), None);
        assert_eq!(certname_from_hostname(""), None);
    }

    #[test]
    fn test_explicit_certname_wins_over_hostname() {
        let cfg = GhostbusterConfig {
            certname: Some("agent01".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.effective_certname().as_deref(), Some("agent01"));
    }

    #[test]
    fn test_default_config_falls_back_to_hostname() {
        let cfg = GhostbusterConfig::default();
        assert_eq!(cfg.effective_certname(), system_certname());
    }

    #[test]
    fn test_hostname_certname_used_for_ssldir_paths() {
        let Some(host) = system_certname() else {
            return;
        };
        let ssldir = fake_ssldir(&host);
        let cfg = GhostbusterConfig {
            ssldir: ssldir.clone(),
            ..Default::default()
        };

        let creds = cfg.tls_credentials().unwrap().unwrap();
        assert_eq!(creds.key, ssldir.join(format!("private_keys/{}.pem", host)));
    }

    #[test]
    fn test_explicit_key_and_cert_need_no_certname() {
        let ssldir = fake_ssldir("agent01");
        let cfg = GhostbusterConfig {
            ssldir: ssldir.clone(),
            hostprivkey: Some(ssldir.join("private_keys/agent01.pem")),
            hostcert: Some(ssldir.join("certs/agent01.pem")),
            ..Default::default()
        };
        assert!(cfg.tls_credentials().unwrap().is_some());
    }

    #[test]
    fn test_missing_credential_file_names_path() {
        let ssldir = fake_ssldir("agent01");
        let cfg = GhostbusterConfig {
            ssldir,
            certname: Some("agent01".to_string()),
            localcacert: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..Default::default()
        };

        let err = cfg.tls_credentials().unwrap_err();
        assert_eq!(err.path(), Some(&PathBuf::from("/nonexistent/ca.pem")));
    }
}
