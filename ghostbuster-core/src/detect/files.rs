//! Pass D: static files no catalog serves.
//!
//! Starts from every candidate under a `files/` directory and strikes out
//! whatever a `puppet:///modules/<modpath>` source covers. What is left is
//! reported. Sources of any other shape are ignored.
//!
//! A source `puppet:///modules/<modpath>` covers candidates whose path
//! contains `/files/<modpath>`. Recursive sources cover everything strictly
//! below that directory; non-recursive ones only a path ending in it.

use regex::Regex;
use std::sync::OnceLock;

use super::{Category, FindingSink, PassReport, UnusedFinding};
use crate::error::GhostbusterResult;
use crate::inventory::{FileUsage, Inventory};
use crate::scan::ModuleTree;

/// `<modpath>` of a `puppet://<server>/modules/<modpath>` source.
pub fn module_path_of(source: &str) -> Option<&str> {
    static SOURCE: OnceLock<Regex> = OnceLock::new();
    let re = SOURCE.get_or_init(|| {
        Regex::new(r"^puppet://.*/modules/(.+)$").expect("Hardcoded regex pattern is valid")
    });
    re.captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Path fragment a candidate must carry to be covered by `modpath`.
fn served_location(modpath: &str) -> String {
    format!("/files/{}", modpath)
}

fn is_covered(candidate: &str, usage: &FileUsage, location: &str) -> bool {
    if usage.recursive {
        candidate.contains(&format!("{}/", location))
    } else {
        candidate.ends_with(location)
    }
}

pub fn find_unused_files<I: Inventory + ?Sized>(
    tree: &ModuleTree,
    inventory: &I,
    sink: &mut FindingSink<'_>,
) -> GhostbusterResult<PassReport> {
    tracing::info!("now trying to find unused files");
    let mut report = PassReport::new(Category::File);

    let mut unused: Vec<String> = tree
        .files()?
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    report.stats.examined = unused.len();
    if unused.is_empty() {
        return Ok(report);
    }

    for usage in inventory.used_files()? {
        let Some(modpath) = module_path_of(&usage.source) else {
            tracing::debug!(source = %usage.source, "source outside modules mount");
            continue;
        };
        let location = served_location(modpath);
        unused.retain(|candidate| !is_covered(candidate, &usage, &location));
    }

    for file in unused {
        report.report(UnusedFinding::new(Category::File, file), sink);
    }

    Ok(report)
}
