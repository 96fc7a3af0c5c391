//! Pass B: defined types with no instances.
//!
//! Costs one uncached PuppetDB round trip per define. Caching per type name
//! would need one cache file per define, so the count is always live.

use super::{declared_symbols, Category, FindingSink, PassReport, UnusedFinding};
use crate::declare::DeclKind;
use crate::error::GhostbusterResult;
use crate::inventory::Inventory;
use crate::scan::ModuleTree;

pub fn find_unused_defines<I: Inventory + ?Sized>(
    tree: &ModuleTree,
    inventory: &I,
    sink: &mut FindingSink<'_>,
) -> GhostbusterResult<PassReport> {
    tracing::info!("now trying to find unused defines");
    let mut report = PassReport::new(Category::Define);

    for symbol in declared_symbols(tree, DeclKind::Define, &mut report)? {
        report.stats.examined += 1;
        let count = inventory.resource_count(&symbol.name)?;
        tracing::debug!(define = %symbol.name, count, "define instances");
        if count == 0 {
            report.report(UnusedFinding::new(Category::Define, symbol.name), sink);
        }
    }

    Ok(report)
}
