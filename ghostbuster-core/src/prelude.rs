//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use ghostbuster_core::prelude::*;
//! ```

// Running
pub use crate::builder::{Ghostbuster, Pass, RunSummary};
pub use crate::config::{load_config, GhostbusterConfig};
pub use crate::error::{GhostbusterError, GhostbusterResult};

// Inventory
pub use crate::inventory::{Inventory, PuppetDbClient};

// Findings and output
pub use crate::detect::{Category, UnusedFinding};
pub use crate::report::{emit, OutputFormat};
