//! Candidate file discovery inside a Puppet module tree.
//!
//! Three kinds of candidates are enumerated, each as the shell globs
//! `<root>/**/manifests/**/*.pp`, `<root>/**/templates/**/*` and
//! `<root>/**/files/**/*` would produce them:
//! - hidden entries below the root are skipped
//! - symlinks are listed but never followed
//! - directories are not candidates, unlike the globs, which also list
//!   subdirectories such as `files/old/`
//!
//! Results are sorted by path and then run through the tree's ignore rules.

use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{GhostbusterError, GhostbusterResult};
use crate::exclude::IgnoreRules;

/// Which glob a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Manifest,
    Template,
    StaticFile,
}

impl CandidateKind {
    /// Directory name that marks this kind in the module layout.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Manifest => "manifests",
            Self::Template => "templates",
            Self::StaticFile => "files",
        }
    }

    fn accepts(self, root: &Path, path: &Path) -> bool {
        if self == Self::Manifest && path.extension().map_or(true, |ext| ext != "pp") {
            return false;
        }
        has_marker_ancestor(root, path, self.dir_name())
    }
}

/// A path plus the glob it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

/// True when a directory named `marker` sits strictly between root and file.
fn has_marker_ancestor(root: &Path, path: &Path, marker: &str) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    let Some(parent) = rel.parent() else {
        return false;
    };
    parent
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == marker))
}

#[inline]
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Checks the link itself, not its target.
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// A module tree rooted at a fixed path, with its ignore rules.
#[derive(Debug, Clone)]
pub struct ModuleTree {
    root: PathBuf,
    rules: IgnoreRules,
}

impl ModuleTree {
    pub fn new(root: impl Into<PathBuf>, rules: IgnoreRules) -> Self {
        Self {
            root: root.into(),
            rules,
        }
    }

    /// Opens a tree and loads `<root>/.ghostbusterignore`.
    pub fn open(root: impl Into<PathBuf>) -> GhostbusterResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GhostbusterError::invalid_config(format!(
                "module tree root {} is not a directory",
                root.display()
            )));
        }
        let rules = IgnoreRules::load(&root)?;
        Ok(Self::new(root, rules))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// All `.pp` files below a `manifests` directory.
    pub fn manifests(&self) -> GhostbusterResult<Vec<PathBuf>> {
        self.paths(CandidateKind::Manifest)
    }

    /// Everything below a `templates` directory.
    pub fn templates(&self) -> GhostbusterResult<Vec<PathBuf>> {
        self.paths(CandidateKind::Template)
    }

    /// Everything below a `files` directory.
    pub fn files(&self) -> GhostbusterResult<Vec<PathBuf>> {
        self.paths(CandidateKind::StaticFile)
    }

    /// Candidates of one kind, sorted and filtered by the ignore rules.
    pub fn candidates(&self, kind: CandidateKind) -> GhostbusterResult<Vec<CandidateFile>> {
        let found = self.gather(kind)?;
        tracing::debug!(kind = kind.dir_name(), count = found.len(), "candidates gathered");
        Ok(found
            .into_iter()
            .map(|path| CandidateFile { path, kind })
            .collect())
    }

    fn paths(&self, kind: CandidateKind) -> GhostbusterResult<Vec<PathBuf>> {
        Ok(self.candidates(kind)?.into_iter().map(|c| c.path).collect())
    }

    fn gather(&self, kind: CandidateKind) -> GhostbusterResult<Vec<PathBuf>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.root).to_path_buf();
                match e.into_io_error() {
                    Some(io) => GhostbusterError::io(path, io),
                    None => GhostbusterError::invalid_config(format!(
                        "filesystem loop under {}",
                        path.display()
                    )),
                }
            })?;

            if entry.file_type().is_dir() {
                continue;
            }
            if kind.accepts(&self.root, entry.path()) {
                found.push(entry.into_path());
            }
        }

        found.sort();
        Ok(self.rules.exclude(found))
    }
}
