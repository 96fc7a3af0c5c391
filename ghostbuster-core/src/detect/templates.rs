//! Pass C: templates no manifest mentions.
//!
//! Purely textual. A template `<module>/templates/<name>` is referenced by
//! any manifest line containing `'<module>/<name>'` (either quote style),
//! and by lines of the module's own manifests containing
//! `'${module_name}/<name>'`. Comments count like everything else.

use regex::Regex;
use std::fs;
use std::path::Path;

use super::{Category, FindingSink, PassReport, UnusedFinding};
use crate::declare::{module_of_manifest, template_parts};
use crate::error::{GhostbusterResult, IoResultExt};
use crate::scan::{is_symlink, ModuleTree};

/// Placeholder Puppet expands to the current module's name.
pub const MODULE_NAME_TOKEN: &str = "${module_name}";

/// A manifest held in memory for the whole pass.
#[derive(Debug)]
struct ManifestText {
    module: Option<String>,
    lines: Vec<String>,
}

/// Reads every non-symlinked manifest once.
fn load_manifests(tree: &ModuleTree, report: &mut PassReport) -> GhostbusterResult<Vec<ManifestText>> {
    let mut out = Vec::new();
    for path in tree.manifests()? {
        if is_symlink(&path) {
            report.skip_symlink(path);
            continue;
        }
        let content = fs::read_to_string(&path).with_path(&path)?;
        out.push(ManifestText {
            module: module_of_manifest(&path),
            lines: content.lines().map(str::to_string).collect(),
        });
    }
    Ok(out)
}

/// `["']<prefix>/<template>["']`
fn quoted_reference(prefix: &str, template: &str) -> Regex {
    let src = format!(
        r#"["']{}/{}["']"#,
        regex::escape(prefix),
        regex::escape(template)
    );
    Regex::new(&src).expect("Escaped reference pattern is valid")
}

/// Lines across all manifests that reference the template.
fn reference_count(manifests: &[ManifestText], module: &str, template: &str) -> usize {
    let qualified = quoted_reference(module, template);
    let local = quoted_reference(MODULE_NAME_TOKEN, template);

    manifests
        .iter()
        .map(|m| {
            let own_module = m.module.as_deref() == Some(module);
            m.lines
                .iter()
                .map(|line| {
                    let mut hits = usize::from(qualified.is_match(line));
                    if own_module && local.is_match(line) {
                        hits += 1;
                    }
                    hits
                })
                .sum::<usize>()
        })
        .sum()
}

fn is_regular_file(path: &Path) -> bool {
    // follows symlinks: a link to a real template is a template
    path.is_file()
}

pub fn find_unused_templates(
    tree: &ModuleTree,
    sink: &mut FindingSink<'_>,
) -> GhostbusterResult<PassReport> {
    tracing::info!("now trying to find unused templates");
    let mut report = PassReport::new(Category::Template);

    let templates = tree.templates()?;
    if templates.is_empty() {
        return Ok(report);
    }
    let manifests = load_manifests(tree, &mut report)?;

    for template in templates {
        if !is_regular_file(&template) {
            continue;
        }
        let Some((module, name)) = template_parts(&template) else {
            continue;
        };

        report.stats.examined += 1;
        let count = reference_count(&manifests, &module, &name);
        tracing::debug!(%module, template = %name, count, "template references");
        if count == 0 {
            let id = template.display().to_string();
            report.report(UnusedFinding::new(Category::Template, id), sink);
        }
    }

    Ok(report)
}
