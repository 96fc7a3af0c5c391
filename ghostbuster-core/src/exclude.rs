//! Per-tree ignore rules read from `<root>/.ghostbusterignore`.
//!
//! Each non-empty line is a regular expression anchored at the module root:
//! a candidate is dropped when `^<root>/<rule>` matches the start of its path.
//! This is a prefix match, not a glob and not a full-string match.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GhostbusterError, GhostbusterResult, IoResultExt};

/// Name of the ignore file looked up at the module root.
pub const IGNORE_FILE: &str = ".ghostbusterignore";

/// Compiled ignore rules for one module tree.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<Regex>,
}

impl IgnoreRules {
    /// No rules; `exclude` is the identity.
    pub fn none() -> Self {
        Self::default()
    }

    /// Reads `<root>/.ghostbusterignore` if it exists.
    ///
    /// A rule that is not a valid regular expression fails the whole load with
    /// a config error naming the offending line.
    pub fn load(root: &Path) -> GhostbusterResult<Self> {
        let path = root.join(IGNORE_FILE);
        if !path.exists() {
            return Ok(Self::none());
        }

        let content = fs::read_to_string(&path).with_path(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        Self::compile(root, &lines).map_err(|(lineno, msg)| {
            GhostbusterError::config(&path, format!("line {}: {}", lineno, msg))
        })
    }

    /// Compiles rules against a root. Errors carry the 1-based line number.
    pub fn from_rules(root: &Path, rules: &[&str]) -> GhostbusterResult<Self> {
        Self::compile(root, rules).map_err(|(lineno, msg)| {
            GhostbusterError::invalid_config(format!("ignore rule {}: {}", lineno, msg))
        })
    }

    fn compile(root: &Path, lines: &[&str]) -> Result<Self, (usize, String)> {
        let root_str = root.to_string_lossy();
        let prefix = regex::escape(root_str.trim_end_matches('/'));

        let mut rules = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            let rule = line.trim_end_matches('\r');
            if rule.is_empty() {
                continue;
            }
            let re = Regex::new(&format!("^{}/{}", prefix, rule))
                .map_err(|e| (i + 1, e.to_string()))?;
            rules.push(re);
        }

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when any rule matches the start of the path.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.rules.iter().any(|re| re.is_match(&text))
    }

    /// Drops excluded candidates, keeping the relative order of the rest.
    pub fn exclude(&self, candidates: Vec<PathBuf>) -> Vec<PathBuf> {
        if self.rules.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|p| !self.is_excluded(p))
            .collect()
    }
}
