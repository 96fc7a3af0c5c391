//! Pass A: classes no node includes.
//!
//! A class counts as used only when its normalized name is exactly one of
//! the `Class` titles PuppetDB knows. `Foo::Bar` being used says nothing
//! about `Foo`.

use super::{declared_symbols, Category, FindingSink, PassReport, UnusedFinding};
use crate::declare::DeclKind;
use crate::error::GhostbusterResult;
use crate::inventory::Inventory;
use crate::scan::ModuleTree;

pub fn find_unused_classes<I: Inventory + ?Sized>(
    tree: &ModuleTree,
    inventory: &I,
    sink: &mut FindingSink<'_>,
) -> GhostbusterResult<PassReport> {
    tracing::info!("now trying to find unused classes");
    let mut report = PassReport::new(Category::Class);

    let declared = declared_symbols(tree, DeclKind::Class, &mut report)?;
    if declared.is_empty() {
        return Ok(report);
    }

    let used = inventory.used_classes()?;
    tracing::debug!(used = used.len(), declared = declared.len(), "cross-referencing classes");

    for symbol in declared {
        report.stats.examined += 1;
        if !used.contains(&symbol.name) {
            report.report(UnusedFinding::new(Category::Class, symbol.name), sink);
        }
    }

    Ok(report)
}
