//! Katari test utilities.
//!
//! Helpers for integration testing: a sample menu tree, filterers and
//! dependency finders with scripted behaviour, and temporary script roots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use katari_kernel::jsmodule::{DependencyError, DependencyFinder};
use katari_kernel::menu::{MenuAccessFilterer, MenuBar, MenuError, MenuNode, NodeLabel};
use parking_lot::Mutex;

/// Build the sample menu used across the menu tests.
///
/// ```text
///                  root           0
///                 /    \
///                a      b         1
///               / \   / | \
///              a   b a  bb b      2
///             /   /     | / \
///            a   a      b a  b    3
/// ```
///
/// Every leaf links to `link_<path segments below root>`, e.g. `/root/b/b/a`
/// links to `link_b_b_a`.
pub fn sample_menu_bar() -> Result<MenuBar, MenuError> {
    let mut bar = MenuBar::new("root", "root")?;
    let root = bar.root_id();

    let a = bar.add_container(root, NodeLabel::new("a"))?;
    let b = bar.add_container(root, NodeLabel::new("b"))?;
    let a_a = bar.add_container(a, NodeLabel::new("a"))?;
    let a_b = bar.add_container(a, NodeLabel::new("b"))?;
    bar.add_leaf(b, NodeLabel::new("a"), "link_b_a")?;
    let b_bb = bar.add_container(b, NodeLabel::new("bb"))?;
    let b_b = bar.add_container(b, NodeLabel::new("b"))?;
    bar.add_leaf(a_a, NodeLabel::new("a"), "link_a_a")?;
    bar.add_leaf(a_b, NodeLabel::new("a"), "link_a_b")?;
    bar.add_leaf(b_bb, NodeLabel::new("b"), "link_b_bb_b")?;
    bar.add_leaf(b_b, NodeLabel::new("a"), "link_b_b_a")?;
    bar.add_leaf(b_b, NodeLabel::new("b"), "link_b_b_b")?;

    Ok(bar)
}

/// Filterer hiding the nodes at the given paths.
#[derive(Debug, Clone, Default)]
pub struct ExcludePaths {
    excluded: Vec<String>,
}

impl ExcludePaths {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            excluded: paths.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl MenuAccessFilterer for ExcludePaths {
    fn filter_menu_nodes<'a>(&self, nodes: &[MenuNode<'a>]) -> Vec<MenuNode<'a>> {
        nodes
            .iter()
            .filter(|node| !self.excluded.iter().any(|p| p == node.path()))
            .copied()
            .collect()
    }
}

/// In-memory dependency finder that records every lookup.
#[derive(Debug, Default)]
pub struct StaticFinder {
    dependencies: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the immediate dependencies of `item`.
    pub fn with(mut self, item: &str, dependencies: &[&str]) -> Self {
        self.dependencies.insert(
            item.to_string(),
            dependencies.iter().map(|d| d.to_string()).collect(),
        );
        self
    }

    /// Make lookups of `item` fail as if its manifest were corrupt.
    pub fn failing_on(mut self, item: &str) -> Self {
        self.failing.push(item.to_string());
        self
    }

    /// Items looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl DependencyFinder for StaticFinder {
    fn find(&self, item: &str) -> Result<Vec<String>, DependencyError> {
        self.calls.lock().push(item.to_string());
        if self.failing.iter().any(|f| f == item) {
            return Err(DependencyError::InvalidManifest {
                path: PathBuf::from(item),
                details: "scripted failure".to_string(),
            });
        }
        Ok(self.dependencies.get(item).cloned().unwrap_or_default())
    }
}

/// A scratch script root below the system temp directory, removed on drop.
#[derive(Debug)]
pub struct ScriptRoot {
    dir: PathBuf,
}

impl ScriptRoot {
    /// Create an empty root. `name` must be unique per test.
    pub fn new(name: &str) -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join(format!("katari_test_{name}"));
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to `relative` (e.g. `/lib/calendar.dep.js`).
    pub fn write(&self, relative: &str, content: &str) -> std::io::Result<()> {
        let path = self.dir.join(relative.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }
}

impl Drop for ScriptRoot {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}
