//! What the live deployment actually uses, as recorded by PuppetDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │    resource.rs      │     │     client.rs       │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Resource records,  │◄────│  HTTP + mTLS query, │
//! │  usage projections  │     │  on-disk cache      │
//! └─────────────────────┘     └──────────┬──────────┘
//!                                        │ impl Inventory
//!                                        ▼
//!                             ┌─────────────────────┐
//!                             │      detect/        │
//!                             └─────────────────────┘
//! ```
//!
//! The detection passes only see the [`Inventory`] trait, so they can run
//! against PuppetDB or against an in-memory stand-in.

pub mod client;
pub mod resource;

use std::collections::HashSet;

use crate::error::GhostbusterResult;

pub use client::{PuppetDbClient, RESOURCES_ENDPOINT};
pub use resource::{
    classes_from_resources, files_from_resources, FileUsage, Resource, REMOTE_FILE_SCHEME,
};

/// Source of "used" facts for the cross-reference passes.
pub trait Inventory {
    /// Titles of every `Class` resource in the catalogs, deduplicated.
    fn used_classes(&self) -> GhostbusterResult<HashSet<String>>;

    /// `(source, recurse)` of every `File` resource served from the
    /// Puppet file server, exact duplicates removed.
    fn used_files(&self) -> GhostbusterResult<Vec<FileUsage>>;

    /// Number of resources whose type is exactly `type_name`.
    fn resource_count(&self, type_name: &str) -> GhostbusterResult<usize>;
}

impl<T: Inventory + ?Sized> Inventory for &T {
    fn used_classes(&self) -> GhostbusterResult<HashSet<String>> {
        (**self).used_classes()
    }

    fn used_files(&self) -> GhostbusterResult<Vec<FileUsage>> {
        (**self).used_files()
    }

    fn resource_count(&self, type_name: &str) -> GhostbusterResult<usize> {
        (**self).resource_count(type_name)
    }
}
