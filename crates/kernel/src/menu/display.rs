//! Selection of the menu entries to display for the current user.
//!
//! Given the currently selected path (e.g. `/root/admin/users`) and a menu
//! level, [`MenuSelector`] walks the active branch of the tree down to that
//! level and returns its visible children, each marked as selected or not and
//! carrying the link the entry should navigate to.

use serde_json::{Value as JsonValue, json};
use tracing::{debug, trace};

use super::error::MenuError;
use super::filter::MenuAccessFilterer;
use super::node::{MenuBar, MenuNode};

/// Link used for containers with no reachable leaf, or whose children were
/// merged from several modules without a home.
pub const DEFAULT_FALLBACK_LINK: &str = "/module/classic-menu/menu.do";

/// A menu node together with its display attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNodeDisplay<'a> {
    node: MenuNode<'a>,
    path: String,
    link_path: String,
    enabled: bool,
    selected: bool,
}

impl<'a> MenuNodeDisplay<'a> {
    /// Build a display entry. A selected entry must be enabled.
    pub fn new(
        node: MenuNode<'a>,
        path: impl Into<String>,
        link_path: impl Into<String>,
        enabled: bool,
        selected: bool,
    ) -> Result<Self, MenuError> {
        if selected && !enabled {
            return Err(MenuError::SelectedDisabled {
                path: node.path().to_string(),
            });
        }
        Ok(Self {
            node,
            path: path.into(),
            link_path: link_path.into(),
            enabled,
            selected,
        })
    }

    pub fn menu_node(&self) -> MenuNode<'a> {
        self.node
    }

    /// Path of the entry the link points into: the node's own path, or the
    /// path of the descendant leaf that provided the link.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn link_path(&self) -> &str {
        &self.link_path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "name": self.node.name(),
            "display_name": self.node.display_name(),
            "tool_tip": self.node.tool_tip(),
            "path": self.path,
            "link_path": self.link_path,
            "enabled": self.enabled,
            "selected": self.selected,
        })
    }
}

/// Computes the visible, annotated entries of one menu level.
pub struct MenuSelector<'a, F> {
    menu: &'a MenuBar,
    filterer: F,
    fallback_link: String,
}

impl<'a, F: MenuAccessFilterer> MenuSelector<'a, F> {
    pub fn new(menu: &'a MenuBar, filterer: F) -> Self {
        Self {
            menu,
            filterer,
            fallback_link: DEFAULT_FALLBACK_LINK.to_string(),
        }
    }

    /// Replace the link used for containers without a reachable leaf.
    pub fn with_fallback_link(mut self, link: impl Into<String>) -> Self {
        self.fallback_link = link.into();
        self
    }

    /// Entries of menu `level` along the branch selected by `current`.
    ///
    /// Level 0 is the root itself and is never returned, so `level` must be
    /// at least 1. Level 1 lists the root's children; deeper levels list the
    /// children of the selected node one level up, or nothing when no node is
    /// selected there.
    pub fn select_level(
        &self,
        current: &str,
        level: usize,
    ) -> Result<Vec<MenuNodeDisplay<'a>>, MenuError> {
        if level == 0 {
            return Err(MenuError::InvalidLevel);
        }
        self.select_at_node(self.menu.root(), current, level - 1)
    }

    /// The children of the node identified by `current`.
    pub fn select_for_path(&self, current: &str) -> Result<Vec<MenuNodeDisplay<'a>>, MenuError> {
        let level = current.matches('/').count();
        self.select_level(current, level)
    }

    fn select_at_node(
        &self,
        node: MenuNode<'a>,
        current: &str,
        remaining: usize,
    ) -> Result<Vec<MenuNodeDisplay<'a>>, MenuError> {
        trace!(node = %node.path(), current = %current, remaining, "selecting menu level");

        let mut nodes = Vec::new();
        if node.is_leaf() {
            return Ok(nodes);
        }

        let current_prefix = format!("{current}/");
        for child in self.filterer.filter_menu_nodes(&node.children()) {
            let selected = current_prefix.starts_with(&format!("{}/", child.path()));
            if remaining == 0 {
                let (path, link_path) = self.resolve_link(child);
                debug!(path = %child.path(), link = %link_path, selected, "adding menu entry");
                nodes.push(MenuNodeDisplay::new(child, path, link_path, true, selected)?);
            } else if selected {
                return self.select_at_node(child, current, remaining - 1);
            }
        }
        Ok(nodes)
    }

    /// Path and link to display for `child`.
    fn resolve_link(&self, child: MenuNode<'a>) -> (String, String) {
        let own = || (child.path().to_string(), self.fallback_link.clone());
        if child.is_leaf() {
            let link = child.link_path().unwrap_or_default();
            return (child.path().to_string(), link.to_string());
        }
        if child.home().is_none() {
            // Children merged from several modules without a home of their own.
            return own();
        }
        match self.find_first_accessible_leaf(child) {
            Some(leaf) => (
                leaf.path().to_string(),
                leaf.link_path().unwrap_or_default().to_string(),
            ),
            None => own(),
        }
    }

    /// The first visible leaf under `node` in document order, descending
    /// through the first visible child at every level.
    pub fn find_first_accessible_leaf(&self, node: MenuNode<'a>) -> Option<MenuNode<'a>> {
        if node.is_leaf() {
            return None;
        }
        let first = self
            .filterer
            .filter_menu_nodes(&node.children())
            .into_iter()
            .next()?;
        if first.is_leaf() {
            Some(first)
        } else {
            self.find_first_accessible_leaf(first)
        }
    }
}
