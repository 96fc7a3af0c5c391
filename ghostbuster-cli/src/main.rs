//! puppet-ghostbuster CLI - find dead code in Puppet module trees.
//!
//! Prints one line per unused class, define, template or file:
//!
//! ```text
//! Class Apache::Mod::Php not used
//! Template /etc/puppetlabs/code/modules/apache/templates/legacy.erb not used
//! ```
//!
//! Exit codes: 0 nothing unused, 1 findings reported, 2 fatal error.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::collections::HashSet;
use std::path::PathBuf;

use ghostbuster_core::{
    emit, init_logging, load_config, log_summary, FileUsage, Ghostbuster, GhostbusterConfig,
    GhostbusterError, GhostbusterResult, Inventory, InventoryCache, OutputFormat, Pass,
    PuppetDbClient, UnusedFinding, CLASSES_QUERY, FILES_QUERY,
};

/// Detection pass selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PassArg {
    Classes,
    Defines,
    Templates,
    Files,
}

impl From<PassArg> for Pass {
    fn from(p: PassArg) -> Self {
        match p {
            PassArg::Classes => Pass::Classes,
            PassArg::Defines => Pass::Defines,
            PassArg::Templates => Pass::Templates,
            PassArg::Files => Pass::Files,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "puppet-ghostbuster",
    author,
    version,
    about = "Find unused Puppet classes, defines, templates and files"
)]
pub struct Cli {
    /// Root of the module tree to scan
    #[arg(default_value = ".")]
    path: PathBuf,

    /// PuppetDB server URL
    #[arg(long, env = "PUPPETDB_URL")]
    puppetdb_url: Option<String>,

    /// Certificate name used to locate credentials in the ssldir
    /// (default: this host's name; required when it differs from the cert)
    #[arg(long, env = "PUPPET_CERTNAME")]
    certname: Option<String>,

    /// Puppet ssldir holding certs/ and private_keys/
    #[arg(long)]
    ssldir: Option<PathBuf>,

    /// Client private key (PEM)
    #[arg(long, env = "PUPPETDB_KEY")]
    key: Option<PathBuf>,

    /// Client certificate (PEM)
    #[arg(long, env = "PUPPETDB_CERT")]
    cert: Option<PathBuf>,

    /// CA certificate (PEM)
    #[arg(long, env = "PUPPETDB_CACERT")]
    cacert: Option<PathBuf>,

    /// Directory for cached PuppetDB answers
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run only these passes (repeatable; default: all)
    #[arg(long, value_enum, num_args = 1..)]
    only: Vec<PassArg>,

    /// Output findings as JSON lines
    #[arg(long)]
    json: bool,

    /// Log in JSON to stderr
    #[arg(long)]
    log_json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    debug: bool,

    /// Delete cached PuppetDB answers for this server before running
    #[arg(long)]
    clear_cache: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn build_config(&self) -> Result<GhostbusterConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => GhostbusterConfig::default(),
        };

        if let Some(url) = &self.puppetdb_url {
            config.puppetdb_url = url.clone();
        }
        if let Some(name) = &self.certname {
            config.certname = Some(name.clone());
        }
        if let Some(dir) = &self.ssldir {
            config.ssldir = dir.clone();
        }
        if let Some(key) = &self.key {
            config.hostprivkey = Some(key.clone());
        }
        if let Some(cert) = &self.cert {
            config.hostcert = Some(cert.clone());
        }
        if let Some(ca) = &self.cacert {
            config.localcacert = Some(ca.clone());
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.debug {
            config.log_level = "debug".to_string();
        }

        Ok(config)
    }

    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Plain
        }
    }

    fn ghostbuster(&self) -> Ghostbuster {
        Ghostbuster::new(&self.path).passes(self.only.iter().copied().map(Pass::from))
    }
}

/// Stand-in when no selected pass needs PuppetDB (templates only).
struct Offline;

impl Inventory for Offline {
    fn used_classes(&self) -> GhostbusterResult<HashSet<String>> {
        Err(GhostbusterError::invalid_config("PuppetDB not configured for this run"))
    }

    fn used_files(&self) -> GhostbusterResult<Vec<FileUsage>> {
        Err(GhostbusterError::invalid_config("PuppetDB not configured for this run"))
    }

    fn resource_count(&self, _type_name: &str) -> GhostbusterResult<usize> {
        Err(GhostbusterError::invalid_config("PuppetDB not configured for this run"))
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli.build_config()?;
    init_logging(&config.log_level, cli.log_json);

    if cli.clear_cache {
        let cache = InventoryCache::new(&config.cache_dir, config.server_identity());
        let removed = cache.clear(&[CLASSES_QUERY, FILES_QUERY])?;
        tracing::info!(removed, dir = %cache.dir().display(), "cache cleared");
    }

    let ghostbuster = cli.ghostbuster();
    let format = cli.output_format();
    let mut sink = |finding: &UnusedFinding| emit(format, finding);

    let summary = if ghostbuster.selected().any(Pass::needs_inventory) {
        let client = PuppetDbClient::new(&config)
            .with_context(|| format!("Failed to set up PuppetDB client for {}", config.puppetdb_url))?;
        ghostbuster.run(&client, &mut sink)?
    } else {
        ghostbuster.run(&Offline, &mut sink)?
    };

    log_summary(&summary);
    Ok(if summary.is_clean() { 0 } else { 1 })
}

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] puppet-ghostbuster internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    let cli = Cli::parse();

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            2
        }
    };
    std::process::exit(code);
}
