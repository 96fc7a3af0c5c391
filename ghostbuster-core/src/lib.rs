//! ghostbuster-core: find dead code in a Puppet module tree
//!
//! Declarations found in the tree are cross-referenced against what the
//! live deployment uses, as recorded by PuppetDB, and against the manifests
//! themselves.
//!
//! # Features
//!
//! - **Unused classes**: first `class` per manifest vs. `Class` resources
//! - **Unused defines**: first `define` per manifest vs. live resource counts
//! - **Unused templates**: quoted `module/template` references in manifests
//! - **Unused files**: `puppet:///modules/...` sources of `File` resources
//! - **Ignore rules**: `.ghostbusterignore` prefix regexes at the tree root
//! - **Inventory cache**: PuppetDB answers kept in `/var/tmp` until deleted
//!
//! Matching is line-oriented, not a parse of the Puppet language.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ghostbuster_core::prelude::*;
//!
//! let config = GhostbusterConfig::default();
//! let inventory = PuppetDbClient::new(&config)?;
//! Ghostbuster::new("/etc/puppetlabs/code/environments/production/modules")
//!     .run(&inventory, &mut |finding| emit(OutputFormat::Plain, finding))?;
//! ```
//!
//! # Module Organization
//!
//! - [`exclude`]: `.ghostbusterignore` rules
//! - [`scan`]: manifest, template and file enumeration
//! - [`declare`]: class/define extraction and name normalization
//! - [`cache`]: on-disk memoization of PuppetDB answers
//! - [`inventory`]: the PuppetDB client behind the [`Inventory`] trait
//! - [`detect`]: the four cross-reference passes
//! - [`builder`]: runs the passes in order
//! - [`report`]: plain and JSON output
//! - [`error`]: typed errors

pub mod builder;
pub mod cache;
pub mod config;
pub mod declare;
pub mod detect;
pub mod error;
pub mod exclude;
pub mod inventory;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod scan;

// Error types
pub use error::{GhostbusterError, GhostbusterResult, IoResultExt};

// Builder API
pub use builder::{Ghostbuster, Pass, RunSummary};

// Cache
pub use cache::{sanitize_identity, InventoryCache, CLASSES_QUERY, FILES_QUERY};

// Configuration
pub use config::{load_config, GhostbusterConfig, TlsCredentials};

// Declarations
pub use declare::{
    first_declaration, module_of_manifest, normalize_name, scan_manifest, template_parts,
    DeclKind, DeclaredSymbol,
};

// Detection passes
pub use detect::{
    find_unused_classes, find_unused_defines, find_unused_files, find_unused_templates,
    Category, FindingSink, PassReport, PassStats, UnusedFinding,
};

// Exclusion
pub use exclude::{IgnoreRules, IGNORE_FILE};

// Inventory
pub use inventory::{FileUsage, Inventory, PuppetDbClient, Resource};

// Logging
pub use logging::init_logging;

// Reporting
pub use report::{emit, format_finding, log_summary, write_finding, OutputFormat};

// Scanning
pub use scan::{is_symlink, CandidateFile, CandidateKind, ModuleTree};
