//! Menu tree storage.
//!
//! A [`MenuBar`] owns every node of one menu tree in an arena. Nodes are
//! addressed by [`NodeId`] while the tree is being built and read through the
//! borrowed [`MenuNode`] handle afterwards. Trees are never mutated while a
//! selection is being computed, so handles can be shared freely.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, trace};

use super::error::MenuError;

/// Matches `${variable-name}` placeholders in leaf links.
#[allow(clippy::expect_used)]
static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid variable pattern"));

/// Matches links that carry their own scheme (`http://`, `mailto://`, ...).
#[allow(clippy::expect_used)]
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+://").expect("valid scheme pattern"));

/// Index of a node inside its [`MenuBar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Naming and ordering attributes of a new node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLabel {
    /// Identifier, unique among siblings. Becomes a path segment.
    pub name: String,
    /// Text shown to the user. Defaults to `name` when empty.
    pub display_name: String,
    /// Sort key applied when menus are merged (lower first).
    pub position: i32,
    /// Optional hover text.
    pub tool_tip: Option<String>,
}

impl NodeLabel {
    /// Label whose display name is the node name itself.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn at_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn with_tool_tip(mut self, tool_tip: impl Into<String>) -> Self {
        self.tool_tip = Some(tool_tip.into());
        self
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    display_name: String,
    position: i32,
    tool_tip: Option<String>,
    path: String,
    /// Set for leaves only.
    link_path: Option<String>,
    is_leaf: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Descendant whose link represents this container.
    home: Option<NodeId>,
}

/// The root of a menu tree and the arena holding all of its nodes.
#[derive(Debug, Clone)]
pub struct MenuBar {
    nodes: Vec<NodeData>,
}

impl MenuBar {
    /// Create a menu bar with no children.
    pub fn new(display_name: &str, name: &str) -> Result<Self, MenuError> {
        validate_name(name)?;
        let root = NodeData {
            name: name.to_string(),
            display_name: display_or_name(display_name, name),
            position: 0,
            tool_tip: None,
            path: format!("/{name}"),
            link_path: None,
            is_leaf: false,
            parent: None,
            children: Vec::new(),
            home: None,
        };
        Ok(Self { nodes: vec![root] })
    }

    /// Id of the root node.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// Handle to the root node.
    pub fn root(&self) -> MenuNode<'_> {
        MenuNode {
            bar: self,
            id: self.root_id(),
        }
    }

    /// Handle to an arbitrary node.
    pub fn node(&self, id: NodeId) -> Option<MenuNode<'_>> {
        (id.0 < self.nodes.len()).then_some(MenuNode { bar: self, id })
    }

    /// Find a node by its full path, e.g. `/root/admin/users`.
    pub fn find(&self, path: &str) -> Option<MenuNode<'_>> {
        self.nodes
            .iter()
            .position(|n| n.path == path)
            .map(|i| MenuNode {
                bar: self,
                id: NodeId(i),
            })
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A menu bar always holds its root, so this only reports whether it has
    /// any children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Add a container node under `parent`.
    pub fn add_container(&mut self, parent: NodeId, label: NodeLabel) -> Result<NodeId, MenuError> {
        self.push_node(parent, label, None)
    }

    /// Add a leaf under `parent`.
    ///
    /// The leaf becomes the home of its parent and of every ancestor that
    /// does not have one yet.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        label: NodeLabel,
        link_path: impl Into<String>,
    ) -> Result<NodeId, MenuError> {
        let id = self.push_node(parent, label, Some(link_path.into()))?;
        self.propagate_home(parent, id);
        Ok(id)
    }

    /// Merge the children of `other`'s root into the node `target`.
    ///
    /// Links of every merged leaf are transformed: `${name}` placeholders are
    /// replaced by `/` followed by the matching entry of `variables`, and
    /// relative links are prefixed with `/{prefix}/`. Same-named containers
    /// are merged recursively; a leaf clashing with any same-named node is an
    /// error. On error the bar is left untouched.
    pub fn merge(
        &mut self,
        target: NodeId,
        other: &MenuBar,
        variables: &HashMap<String, String>,
        prefix: &str,
    ) -> Result<(), MenuError> {
        let target_data = self.data(target)?;
        if target_data.is_leaf {
            return Err(MenuError::LeafConflict {
                path: target_data.path.clone(),
            });
        }
        trace!(target = %target_data.path, other = %other.nodes[0].path, "merging menu");

        let mut merged = self.clone();
        let links = LinkTransform { variables, prefix };
        merged.merge_children(target, other, other.root_id(), &links)?;
        *self = merged;
        Ok(())
    }

    fn merge_children(
        &mut self,
        target: NodeId,
        other: &MenuBar,
        other_id: NodeId,
        links: &LinkTransform<'_>,
    ) -> Result<(), MenuError> {
        for &other_child in &other.nodes[other_id.0].children {
            let other_data = &other.nodes[other_child.0];
            match self.child_named(target, &other_data.name) {
                Some(existing) => {
                    if self.nodes[existing.0].is_leaf || other_data.is_leaf {
                        return Err(MenuError::LeafConflict {
                            path: self.nodes[existing.0].path.clone(),
                        });
                    }
                    self.merge_children(existing, other, other_child, links)?;
                }
                None => {
                    self.copy_subtree(target, other, other_child, links)?;
                }
            }
        }

        let mut children = std::mem::take(&mut self.nodes[target.0].children);
        children.sort_by_key(|c| self.nodes[c.0].position);
        let first = children.first().copied();
        self.nodes[target.0].children = children;

        if self.nodes[target.0].home.is_none() && first.is_some() {
            self.nodes[target.0].home = first;
        }
        Ok(())
    }

    /// Copy `other_id` and its descendants under `parent`, keeping the homes
    /// they had in `other`.
    fn copy_subtree(
        &mut self,
        parent: NodeId,
        other: &MenuBar,
        other_id: NodeId,
        links: &LinkTransform<'_>,
    ) -> Result<NodeId, MenuError> {
        let mut copied: HashMap<NodeId, NodeId> = HashMap::new();
        let root = self.copy_node(parent, other, other_id, links, &mut copied)?;

        for (&from, &to) in &copied {
            let home = other.nodes[from.0]
                .home
                .and_then(|h| copied.get(&h).copied());
            self.nodes[to.0].home = home;
        }
        Ok(root)
    }

    fn copy_node(
        &mut self,
        parent: NodeId,
        other: &MenuBar,
        other_id: NodeId,
        links: &LinkTransform<'_>,
        copied: &mut HashMap<NodeId, NodeId>,
    ) -> Result<NodeId, MenuError> {
        let data = &other.nodes[other_id.0];
        let label = NodeLabel {
            name: data.name.clone(),
            display_name: data.display_name.clone(),
            position: data.position,
            tool_tip: data.tool_tip.clone(),
        };
        let link = match &data.link_path {
            Some(link) if data.is_leaf => Some(links.apply(link)?),
            _ => None,
        };
        let id = self.push_node(parent, label, link)?;
        copied.insert(other_id, id);

        for &child in &data.children {
            self.copy_node(id, other, child, links, copied)?;
        }
        Ok(id)
    }

    fn push_node(
        &mut self,
        parent: NodeId,
        label: NodeLabel,
        link_path: Option<String>,
    ) -> Result<NodeId, MenuError> {
        validate_name(&label.name)?;
        let parent_data = self.data(parent)?;
        if parent_data.is_leaf {
            return Err(MenuError::ChildOfLeaf {
                path: parent_data.path.clone(),
            });
        }
        let path = format!("{}/{}", parent_data.path, label.name);
        if self.child_named(parent, &label.name).is_some() {
            return Err(MenuError::DuplicateNode { path });
        }

        let id = NodeId(self.nodes.len());
        debug!(path = %path, leaf = link_path.is_some(), "adding menu node");
        self.nodes.push(NodeData {
            display_name: display_or_name(&label.display_name, &label.name),
            name: label.name,
            position: label.position,
            tool_tip: label.tool_tip,
            path,
            is_leaf: link_path.is_some(),
            link_path,
            parent: Some(parent),
            children: Vec::new(),
            home: None,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    fn propagate_home(&mut self, from: NodeId, home: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &mut self.nodes[id.0];
            if node.home.is_some() {
                break;
            }
            node.home = Some(home);
            current = node.parent;
        }
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].name == name)
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, MenuError> {
        self.nodes
            .get(id.0)
            .ok_or(MenuError::UnknownNode { id: id.0 })
    }
}

/// Read-only handle to one node of a [`MenuBar`].
#[derive(Clone, Copy)]
pub struct MenuNode<'a> {
    bar: &'a MenuBar,
    id: NodeId,
}

impl<'a> MenuNode<'a> {
    fn data(&self) -> &'a NodeData {
        &self.bar.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn display_name(&self) -> &'a str {
        &self.data().display_name
    }

    pub fn position(&self) -> i32 {
        self.data().position
    }

    pub fn tool_tip(&self) -> Option<&'a str> {
        self.data().tool_tip.as_deref()
    }

    /// Full slash separated path from the root, e.g. `/root/a/b`.
    pub fn path(&self) -> &'a str {
        &self.data().path
    }

    pub fn is_leaf(&self) -> bool {
        self.data().is_leaf
    }

    /// The navigation target of this node.
    ///
    /// Leaves return their own link, containers the link of their home.
    /// `None` for a container without a home.
    pub fn link_path(&self) -> Option<&'a str> {
        let data = self.data();
        if data.is_leaf {
            data.link_path.as_deref()
        } else {
            self.home().and_then(|home| home.link_path())
        }
    }

    /// The descendant whose link represents this container.
    pub fn home(&self) -> Option<MenuNode<'a>> {
        self.data().home.map(|id| MenuNode { bar: self.bar, id })
    }

    pub fn parent(&self) -> Option<MenuNode<'a>> {
        self.data().parent.map(|id| MenuNode { bar: self.bar, id })
    }

    /// Children in display order. Empty for leaves.
    pub fn children(&self) -> Vec<MenuNode<'a>> {
        self.data()
            .children
            .iter()
            .map(|&id| MenuNode { bar: self.bar, id })
            .collect()
    }
}

impl PartialEq for MenuNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.bar, other.bar) && self.id == other.id
    }
}

impl Eq for MenuNode<'_> {}

impl fmt::Debug for MenuNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuNode")
            .field("path", &self.path())
            .field("leaf", &self.is_leaf())
            .finish()
    }
}

/// Rewrites the links of merged leaves.
struct LinkTransform<'a> {
    variables: &'a HashMap<String, String>,
    prefix: &'a str,
}

impl LinkTransform<'_> {
    fn apply(&self, link: &str) -> Result<String, MenuError> {
        let mut missing = None;
        let replaced = VARIABLE_RE.replace_all(link, |caps: &Captures<'_>| {
            let name = &caps[1];
            match self.variables.get(name) {
                Some(value) => format!("/{value}"),
                None => {
                    missing.get_or_insert_with(|| name.to_string());
                    String::new()
                }
            }
        });
        if let Some(name) = missing {
            return Err(MenuError::UnknownVariable {
                name,
                link: link.to_string(),
            });
        }

        let result = if replaced.starts_with('/') || SCHEME_RE.is_match(&replaced) {
            replaced.into_owned()
        } else if replaced.is_empty() {
            format!("/{}/", self.prefix)
        } else {
            format!("/{}/{replaced}", self.prefix)
        };
        trace!(from = %link, to = %result, "transformed menu link");
        Ok(result)
    }
}

fn validate_name(name: &str) -> Result<(), MenuError> {
    if name.is_empty() {
        return Err(MenuError::InvalidName {
            name: name.to_string(),
            reason: "the name cannot be empty",
        });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(MenuError::InvalidName {
            name: name.to_string(),
            reason: "the name cannot contain spaces",
        });
    }
    if name.contains('/') {
        return Err(MenuError::InvalidName {
            name: name.to_string(),
            reason: "the name cannot contain '/'",
        });
    }
    Ok(())
}

fn display_or_name(display_name: &str, name: &str) -> String {
    if display_name.is_empty() {
        name.to_string()
    } else {
        display_name.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn label(name: &str) -> NodeLabel {
        NodeLabel::new(name)
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let root = bar.root_id();
        bar.add_leaf(root, label("users").at_position(5), "users.do")
            .unwrap();
        bar.add_leaf(root, label("clients").at_position(1), "clients.do")
            .unwrap();

        let names: Vec<_> = bar.root().children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["users", "clients"]);
    }

    #[test]
    fn path_is_built_from_ancestors() {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let a = bar.add_container(bar.root_id(), label("levelA")).unwrap();
        let b = bar.add_container(a, label("levelB")).unwrap();
        let c = bar.add_leaf(b, label("levelC"), "link").unwrap();

        assert_eq!(bar.node(c).unwrap().path(), "/root/levelA/levelB/levelC");
        assert_eq!(bar.node(c).unwrap().parent().unwrap().id(), b);
        assert_eq!(bar.find("/root/levelA/levelB").unwrap().id(), b);
    }

    #[test]
    fn leaf_becomes_home_of_all_ancestors() {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let a = bar.add_container(bar.root_id(), label("a")).unwrap();
        let b = bar.add_container(a, label("b")).unwrap();
        let c = bar.add_leaf(b, label("c"), "link-c").unwrap();
        bar.add_leaf(b, label("d"), "link-d").unwrap();

        assert_eq!(bar.node(b).unwrap().home().unwrap().id(), c);
        assert_eq!(bar.node(a).unwrap().home().unwrap().id(), c);
        assert_eq!(bar.root().home().unwrap().id(), c);
        assert_eq!(bar.root().link_path(), Some("link-c"));
    }

    #[test]
    fn display_name_defaults_to_name() {
        let mut bar = MenuBar::new("", "root").unwrap();
        let id = bar
            .add_leaf(bar.root_id(), label("users").with_tool_tip("All users"), "u")
            .unwrap();
        let node = bar.node(id).unwrap();
        assert_eq!(bar.root().display_name(), "root");
        assert_eq!(node.display_name(), "users");
        assert_eq!(node.tool_tip(), Some("All users"));
    }

    #[test]
    fn invalid_names_rejected() {
        assert!(matches!(
            MenuBar::new("Root", ""),
            Err(MenuError::InvalidName { .. })
        ));
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let root = bar.root_id();
        assert!(matches!(
            bar.add_container(root, label("two words")),
            Err(MenuError::InvalidName { .. })
        ));
        assert!(matches!(
            bar.add_container(root, label("a/b")),
            Err(MenuError::InvalidName { .. })
        ));
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let root = bar.root_id();
        bar.add_container(root, label("admin")).unwrap();
        let err = bar.add_leaf(root, label("admin"), "x").unwrap_err();
        assert!(err.to_string().contains("/root/admin"));
    }

    #[test]
    fn leaf_cannot_have_children() {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let leaf = bar.add_leaf(bar.root_id(), label("users"), "link").unwrap();
        assert!(bar.node(leaf).unwrap().children().is_empty());
        assert!(matches!(
            bar.add_container(leaf, label("x")),
            Err(MenuError::ChildOfLeaf { .. })
        ));
    }

    #[test]
    fn merge_combines_same_named_containers() {
        let mut bar1 = MenuBar::new("Root", "root").unwrap();
        let a1 = bar1.add_container(bar1.root_id(), label("levelA")).unwrap();
        let b1 = bar1.add_container(a1, label("levelB")).unwrap();
        bar1.add_leaf(b1, label("levelC1"), "link").unwrap();

        let mut bar2 = MenuBar::new("Root", "root").unwrap();
        let a2 = bar2.add_container(bar2.root_id(), label("levelA")).unwrap();
        let b2 = bar2.add_container(a2, label("levelB")).unwrap();
        bar2.add_leaf(b2, label("levelC2"), "link").unwrap();

        let root = bar1.root_id();
        bar1.merge(root, &bar2, &HashMap::new(), "").unwrap();

        let level_a = bar1.root().children();
        assert_eq!(level_a.len(), 1);
        let level_b = level_a[0].children();
        assert_eq!(level_b.len(), 1);
        let level_c = level_b[0].children();
        assert_eq!(level_c.len(), 2);
        assert_eq!(level_c[1].path(), "/root/levelA/levelB/levelC2");
        assert_eq!(level_c[1].parent().unwrap().id(), b1);
    }

    #[test]
    fn merge_replaces_variables_and_prefixes_relative_links() {
        let mut top = MenuBar::new("Root", "root").unwrap();

        let mut bar1 = MenuBar::new("Root", "root").unwrap();
        bar1.add_leaf(bar1.root_id(), label("levelA1"), "link-1")
            .unwrap();
        let mut bar2 = MenuBar::new("Root", "root").unwrap();
        bar2.add_leaf(bar2.root_id(), label("levelA2"), "${var1}/link-2")
            .unwrap();
        let mut bar3 = MenuBar::new("Root", "root").unwrap();
        bar3.add_leaf(bar3.root_id(), label("external"), "http://example.com/x")
            .unwrap();

        let variables = HashMap::from([("var1".to_string(), "value-1".to_string())]);
        let root = top.root_id();
        top.merge(root, &bar1, &variables, "prefix").unwrap();
        top.merge(root, &bar2, &variables, "prefix").unwrap();
        top.merge(root, &bar3, &variables, "prefix").unwrap();

        let children = top.root().children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].link_path(), Some("/prefix/link-1"));
        assert_eq!(children[1].link_path(), Some("/value-1/link-2"));
        assert_eq!(children[2].link_path(), Some("http://example.com/x"));
    }

    #[test]
    fn merge_empty_link_becomes_module_root() {
        let mut bar1 = MenuBar::new("Root", "root").unwrap();
        bar1.add_leaf(bar1.root_id(), label("levelB1"), "link").unwrap();
        let mut bar2 = MenuBar::new("Root", "root").unwrap();
        bar2.add_leaf(bar2.root_id(), label("levelB2"), "").unwrap();

        let root = bar1.root_id();
        bar1.merge(root, &bar2, &HashMap::new(), "somepref").unwrap();
        assert_eq!(
            bar1.find("/root/levelB2").unwrap().link_path(),
            Some("/somepref/")
        );
    }

    #[test]
    fn merge_unknown_variable_leaves_bar_untouched() {
        let mut bar1 = MenuBar::new("Root", "root").unwrap();
        let mut bar2 = MenuBar::new("Root", "root").unwrap();
        bar2.add_leaf(bar2.root_id(), label("ok"), "ok.do").unwrap();
        bar2.add_leaf(bar2.root_id(), label("broken"), "${nope}/x.do")
            .unwrap();

        let root = bar1.root_id();
        let err = bar1.merge(root, &bar2, &HashMap::new(), "m").unwrap_err();
        assert!(matches!(err, MenuError::UnknownVariable { ref name, .. } if name == "nope"));
        assert!(bar1.is_empty());
    }

    #[test]
    fn merge_leaf_conflict_rejected() {
        let mut bar1 = MenuBar::new("Root", "root").unwrap();
        bar1.add_leaf(bar1.root_id(), label("users"), "a").unwrap();
        let mut bar2 = MenuBar::new("Root", "root").unwrap();
        bar2.add_container(bar2.root_id(), label("users")).unwrap();

        let root = bar1.root_id();
        let err = bar1.merge(root, &bar2, &HashMap::new(), "m").unwrap_err();
        assert!(matches!(err, MenuError::LeafConflict { ref path } if path == "/root/users"));
    }

    #[test]
    fn merge_sorts_by_position_and_sets_default_home() {
        let mut top = MenuBar::new("Root", "root").unwrap();
        let mut other = MenuBar::new("Root", "root").unwrap();
        let root = other.root_id();
        let late = other.add_container(root, label("late").at_position(9)).unwrap();
        other.add_leaf(late, label("x"), "x.do").unwrap();
        other.add_leaf(root, label("early").at_position(1), "early.do")
            .unwrap();

        let top_root = top.root_id();
        top.merge(top_root, &other, &HashMap::new(), "mod").unwrap();

        let children = top.root().children();
        assert_eq!(children[0].name(), "early");
        assert_eq!(children[1].name(), "late");
        assert_eq!(top.root().home().unwrap().name(), "early");
        // copied containers keep their own homes
        assert_eq!(children[1].link_path(), Some("/mod/x.do"));
    }
}
