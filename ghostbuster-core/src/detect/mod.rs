//! Cross-referencing declared symbols against evidence of use.
//!
//! Four independent passes, each pairing something declared in the tree
//! with something that proves it is used:
//!
//! | Pass | Declared                  | Evidence                              |
//! |------|---------------------------|---------------------------------------|
//! | A    | first `class` per manifest | `Class` titles in PuppetDB (cached)  |
//! | B    | first `define` per manifest| live resource count for that type    |
//! | C    | files under `templates/`   | quoted `module/template` in manifests|
//! | D    | files under `files/`       | `puppet://` sources in PuppetDB      |
//!
//! Passes share no state. Each streams findings into a sink as they are
//! found and returns a [`PassReport`] with the same findings plus counters.

pub mod classes;
pub mod defines;
pub mod files;
pub mod templates;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::declare::{scan_manifest, DeclKind, DeclaredSymbol};
use crate::error::GhostbusterResult;
use crate::scan::{is_symlink, ModuleTree};

pub use classes::find_unused_classes;
pub use defines::find_unused_defines;
pub use files::{find_unused_files, module_path_of};
pub use templates::find_unused_templates;

/// What kind of thing was found unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Class,
    Define,
    Template,
    File,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Class => "Class",
            Self::Define => "Define",
            Self::Template => "Template",
            Self::File => "File",
        };
        f.write_str(name)
    }
}

/// One unused class, define, template or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedFinding {
    pub category: Category,
    /// Normalized name for classes and defines, path for templates and files
    pub identifier: String,
}

impl UnusedFinding {
    pub fn new(category: Category, identifier: impl Into<String>) -> Self {
        Self {
            category,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for UnusedFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} not used", self.category, self.identifier)
    }
}

/// Receives findings as soon as a pass decides them.
pub type FindingSink<'a> = dyn FnMut(&UnusedFinding) + 'a;

/// Counters for a single pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Symbols or files checked against evidence
    pub examined: usize,
    /// Symlinked manifests left out of the scan
    pub skipped_symlinks: usize,
    pub unused: usize,
}

/// Outcome of a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub category: Category,
    pub stats: PassStats,
    pub findings: Vec<UnusedFinding>,
    /// Symlinked manifests that were skipped, in scan order
    pub skipped: Vec<PathBuf>,
}

impl PassReport {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            stats: PassStats::default(),
            findings: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Records a finding and forwards it to the sink.
    pub(crate) fn report(&mut self, finding: UnusedFinding, sink: &mut FindingSink<'_>) {
        sink(&finding);
        self.stats.unused += 1;
        self.findings.push(finding);
    }

    /// Warns about and records a symlinked manifest.
    pub(crate) fn skip_symlink(&mut self, path: PathBuf) {
        tracing::warn!(file = %path.display(), "skipping symlink");
        self.stats.skipped_symlinks += 1;
        self.skipped.push(path);
    }
}

/// First declaration of `kind` in every non-symlinked manifest.
pub(crate) fn declared_symbols(
    tree: &ModuleTree,
    kind: DeclKind,
    report: &mut PassReport,
) -> GhostbusterResult<Vec<DeclaredSymbol>> {
    let mut out = Vec::new();
    for manifest in tree.manifests()? {
        tracing::debug!(file = %manifest.display(), "scanning for {}", kind.keyword());
        if is_symlink(&manifest) {
            report.skip_symlink(manifest);
            continue;
        }
        if let Some(symbol) = scan_manifest(kind, &manifest)? {
            out.push(symbol);
        }
    }
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_display() {
        assert_eq!(
            UnusedFinding::new(Category::Class, "Mod").to_string(),
            "Class Mod not used"
        );
        assert_eq!(
            UnusedFinding::new(Category::Template, "/m/a/templates/x.erb").to_string(),
            "Template /m/a/templates/x.erb not used"
        );
    }

    #[test]
    fn test_report_streams_and_counts() {
        let mut seen = Vec::new();
        let mut report = PassReport::new(Category::Define);
        {
            let mut sink = |f: &UnusedFinding| seen.push(f.to_string());
            report.report(UnusedFinding::new(Category::Define, "A::B"), &mut sink);
        }

        assert_eq!(seen, vec!["Define A::B not used"]);
        assert_eq!(report.stats.unused, 1);
        assert_eq!(report.findings.len(), 1);
    }
}
