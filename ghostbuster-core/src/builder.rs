//! Builder API that runs the detection passes over a module tree.
//!
//! ```rust,ignore
//! use ghostbuster_core::prelude::*;
//!
//! let config = GhostbusterConfig::default();
//! let inventory = PuppetDbClient::new(&config)?;
//! let summary = Ghostbuster::new("/etc/puppetlabs/code/modules")
//!     .passes([Pass::Classes, Pass::Files])
//!     .run(&inventory, &mut |f| println!("{}", f))?;
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::detect::{
    find_unused_classes, find_unused_defines, find_unused_files, find_unused_templates,
    FindingSink, PassReport,
};
use crate::error::GhostbusterResult;
use crate::inventory::Inventory;
use crate::scan::ModuleTree;

/// One detection pass. Ordering is the order passes run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pass {
    Classes,
    Defines,
    Templates,
    Files,
}

impl Pass {
    pub const ALL: [Pass; 4] = [Pass::Classes, Pass::Defines, Pass::Templates, Pass::Files];

    pub fn name(self) -> &'static str {
        match self {
            Self::Classes => "classes",
            Self::Defines => "defines",
            Self::Templates => "templates",
            Self::Files => "files",
        }
    }

    /// Whether the pass talks to the inventory at all.
    pub fn needs_inventory(self) -> bool {
        !matches!(self, Self::Templates)
    }
}

/// Reports of every pass that ran, in run order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<PassReport>,
}

impl RunSummary {
    pub fn total_unused(&self) -> usize {
        self.reports.iter().map(|r| r.stats.unused).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_unused() == 0
    }
}

/// Configures and runs the passes.
#[derive(Debug, Clone)]
pub struct Ghostbuster {
    root: PathBuf,
    passes: BTreeSet<Pass>,
}

impl Ghostbuster {
    /// All passes over the tree at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            passes: Pass::ALL.into_iter().collect(),
        }
    }

    /// Restricts the run to the given passes. They still run in A-D order.
    /// An empty selection keeps all passes.
    pub fn passes(mut self, passes: impl IntoIterator<Item = Pass>) -> Self {
        let selected: BTreeSet<Pass> = passes.into_iter().collect();
        if !selected.is_empty() {
            self.passes = selected;
        }
        self
    }

    pub fn selected(&self) -> impl Iterator<Item = Pass> + '_ {
        self.passes.iter().copied()
    }

    /// Runs the selected passes in order. The first error stops the run.
    pub fn run<I: Inventory + ?Sized>(
        &self,
        inventory: &I,
        sink: &mut FindingSink<'_>,
    ) -> GhostbusterResult<RunSummary> {
        let span = tracing::info_span!("ghostbuster", root = %self.root.display());
        let _guard = span.enter();

        let tree = ModuleTree::open(&self.root)?;
        tracing::debug!(rules = tree.rules().len(), "ignore rules loaded");

        let mut summary = RunSummary::default();
        for pass in self.selected() {
            let pass_span = tracing::info_span!("pass", pass = pass.name());
            let _pass_guard = pass_span.enter();

            let report = match pass {
                Pass::Classes => find_unused_classes(&tree, inventory, sink)?,
                Pass::Defines => find_unused_defines(&tree, inventory, sink)?,
                Pass::Templates => find_unused_templates(&tree, sink)?,
                Pass::Files => find_unused_files(&tree, inventory, sink)?,
            };
            summary.reports.push(report);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::test_support::{create_temp_dir, write_file, FakeInventory};
    use crate::detect::{Category, UnusedFinding};

    #[test]
    fn test_default_runs_all_in_order() {
        let root = create_temp_dir("builder_all");
        let summary = Ghostbuster::new(&root)
            .run(&FakeInventory::default(), &mut |_: &UnusedFinding| {})
            .unwrap();

        let order: Vec<Category> = summary.reports.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![Category::Class, Category::Define, Category::Template, Category::File]
        );
        assert!(summary.is_clean());
    }

    #[test]
    fn test_selection_is_reordered() {
        let gb = Ghostbuster::new("/tmp").passes([Pass::Files, Pass::Classes, Pass::Files]);
        assert_eq!(gb.selected().collect::<Vec<_>>(), vec![Pass::Classes, Pass::Files]);
    }

    #[test]
    fn test_empty_selection_keeps_all() {
        let gb = Ghostbuster::new("/tmp").passes(Vec::<Pass>::new());
        assert_eq!(gb.selected().count(), 4);
    }

    #[test]
    fn test_templates_only_never_touches_inventory() {
        let root = create_temp_dir("builder_templates");
        write_file(&root.join("m/manifests/init.pp"), "class m {}\n");
        write_file(&root.join("m/templates/t.erb"), "");

        let inv = FakeInventory {
            down: true,
            ..Default::default()
        };
        let summary = Ghostbuster::new(&root)
            .passes([Pass::Templates])
            .run(&inv, &mut |_: &UnusedFinding| {})
            .unwrap();
        assert_eq!(summary.total_unused(), 1);
        assert!(!Pass::Templates.needs_inventory());
    }

    #[test]
    fn test_inventory_failure_stops_run() {
        let root = create_temp_dir("builder_down");
        write_file(&root.join("m/manifests/init.pp"), "class m {}\n");
        write_file(&root.join("m/templates/t.erb"), "");

        let inv = FakeInventory {
            down: true,
            ..Default::default()
        };
        let mut seen = 0;
        let err = Ghostbuster::new(&root)
            .run(&inv, &mut |_: &UnusedFinding| seen += 1)
            .unwrap_err();
        assert!(err.is_inventory());
        // pass C never ran
        assert_eq!(seen, 0);
    }
}
