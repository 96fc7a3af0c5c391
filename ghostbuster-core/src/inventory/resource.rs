//! PuppetDB resource records and the projections the passes need.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Only files fetched from the Puppet file server can point into the tree.
pub const REMOTE_FILE_SCHEME: &str = "puppet://";

/// One entry of a `/pdb/query/v4/resources` answer.
///
/// Only the fields the passes look at are kept; PuppetDB sends more
/// (`certname`, `file`, `line`, `tags`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A `File` resource sourced from the Puppet file server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileUsage {
    /// e.g. `puppet:///modules/apache/httpd.conf`
    pub source: String,
    pub recursive: bool,
}

impl FileUsage {
    pub fn new(source: impl Into<String>, recursive: bool) -> Self {
        Self {
            source: source.into(),
            recursive,
        }
    }
}

/// Interprets the `recurse` parameter. Puppet accepts booleans as well as
/// the strings `"true"`, `"false"` and `"remote"`.
fn is_recursive(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "remote"),
        _ => false,
    }
}

/// Distinct titles of `Class` resources.
pub fn classes_from_resources(resources: &[Resource]) -> HashSet<String> {
    resources
        .iter()
        .filter(|r| r.kind == "Class")
        .map(|r| r.title.clone())
        .collect()
}

/// `File` resources with a `puppet://` source, projected and deduplicated.
///
/// A `source` given as an array (Puppet tries each in turn) contributes its
/// first element. First-seen order is kept.
pub fn files_from_resources(resources: &[Resource]) -> Vec<FileUsage> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for res in resources.iter().filter(|r| r.kind == "File") {
        let source = match res.parameters.get("source") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Array(items)) => match items.first().and_then(Value::as_str) {
                Some(s) => s,
                None => continue,
            },
            _ => continue,
        };
        if !source.starts_with(REMOTE_FILE_SCHEME) {
            continue;
        }

        let usage = FileUsage::new(source, is_recursive(res.parameters.get("recurse")));
        if seen.insert(usage.clone()) {
            out.push(usage);
        }
    }

    out
}
