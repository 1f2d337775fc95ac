//! Security filtering of menu nodes.
//!
//! The selector never decides visibility itself: it hands each list of
//! children to a [`MenuAccessFilterer`] and works with whatever survives.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::trace;

use super::node::MenuNode;

/// Restricts a list of menu nodes to those the current principal may see.
///
/// Implementations must only drop nodes: the survivors keep their relative
/// order and the tree is never modified.
pub trait MenuAccessFilterer: Send + Sync {
    fn filter_menu_nodes<'a>(&self, nodes: &[MenuNode<'a>]) -> Vec<MenuNode<'a>>;
}

impl<T: MenuAccessFilterer + ?Sized> MenuAccessFilterer for &T {
    fn filter_menu_nodes<'a>(&self, nodes: &[MenuNode<'a>]) -> Vec<MenuNode<'a>> {
        (**self).filter_menu_nodes(nodes)
    }
}

/// Filterer that shows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl MenuAccessFilterer for AllowAll {
    fn filter_menu_nodes<'a>(&self, nodes: &[MenuNode<'a>]) -> Vec<MenuNode<'a>> {
        nodes.to_vec()
    }
}

/// Decides whether the current principal may open a URL.
pub trait UrlAccess: Send + Sync {
    fn can_access_url(&self, url: &str) -> bool;
}

/// Filterer backed by URL access checks.
///
/// A leaf is visible when its link is accessible. A container is visible
/// when at least one of its children is, recursively, so a branch with no
/// reachable leaf disappears entirely.
#[derive(Debug, Clone)]
pub struct SecureMenuFilterer<A> {
    access: A,
}

impl<A: UrlAccess> SecureMenuFilterer<A> {
    pub fn new(access: A) -> Self {
        Self { access }
    }

    /// Whether a leaf's link is accessible. Containers are never accessible
    /// on their own.
    pub fn is_accessible(&self, leaf: &MenuNode<'_>) -> bool {
        leaf.is_leaf()
            && leaf
                .link_path()
                .is_some_and(|link| self.access.can_access_url(link))
    }
}

impl<A: UrlAccess> MenuAccessFilterer for SecureMenuFilterer<A> {
    fn filter_menu_nodes<'a>(&self, nodes: &[MenuNode<'a>]) -> Vec<MenuNode<'a>> {
        let visible: Vec<_> = nodes
            .iter()
            .filter(|node| {
                if node.is_leaf() {
                    self.is_accessible(node)
                } else {
                    !self.filter_menu_nodes(&node.children()).is_empty()
                }
            })
            .copied()
            .collect();
        trace!(total = nodes.len(), visible = visible.len(), "filtered menu nodes");
        visible
    }
}

/// A URL prefix guarded by a permission.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessRule {
    /// URL prefix, matched on `/` boundaries (e.g. `/module/user`).
    pub prefix: String,
    /// Permission required to open URLs under `prefix`.
    pub permission: String,
}

/// URL access rules, usually loaded from a TOML file:
///
/// ```toml
/// [[rule]]
/// prefix = "/module/user"
/// permission = "administer users"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessRules {
    #[serde(default, rename = "rule")]
    rules: Vec<AccessRule>,
}

impl AccessRules {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Parse rules from a TOML file.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read access rules: {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("failed to parse access rules at {}", path.display()))
    }

    /// Parse rules from a TOML string.
    pub fn parse_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// The permission guarding `url`: the rule with the longest matching
    /// prefix wins. `None` means the URL is public.
    pub fn required_permission(&self, url: &str) -> Option<&str> {
        self.rules
            .iter()
            .filter(|rule| prefix_matches(&rule.prefix, url))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.permission.as_str())
    }

    /// Bind the rules to a principal's granted permissions.
    pub fn for_principal(self, granted: HashSet<String>, is_admin: bool) -> PrincipalAccess {
        PrincipalAccess {
            rules: self,
            granted,
            is_admin,
        }
    }
}

/// URL access for one principal.
///
/// - Admins can access everything.
/// - Other principals need the permission of the most specific matching rule.
#[derive(Debug, Clone)]
pub struct PrincipalAccess {
    rules: AccessRules,
    granted: HashSet<String>,
    is_admin: bool,
}

impl UrlAccess for PrincipalAccess {
    fn can_access_url(&self, url: &str) -> bool {
        if self.is_admin {
            return true;
        }
        match self.rules.required_permission(url) {
            Some(permission) => self.granted.contains(permission),
            None => true,
        }
    }
}

/// `/module/user` matches `/module/user`, `/module/user/list.do` and
/// `/module/user?x=1` but not `/module/users`.
fn prefix_matches(prefix: &str, url: &str) -> bool {
    let Some(rest) = url.strip_prefix(prefix) else {
        return false;
    };
    rest.is_empty() || prefix.ends_with('/') || rest.starts_with(['/', '?'])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::menu::node::{MenuBar, NodeLabel};

    struct DenyList(Vec<&'static str>);

    impl UrlAccess for DenyList {
        fn can_access_url(&self, url: &str) -> bool {
            !self.0.iter().any(|denied| *denied == url)
        }
    }

    fn sample_bar() -> MenuBar {
        let mut bar = MenuBar::new("Root", "root").unwrap();
        let root = bar.root_id();
        let admin = bar.add_container(root, NodeLabel::new("admin")).unwrap();
        bar.add_leaf(admin, NodeLabel::new("users"), "/users.do")
            .unwrap();
        bar.add_leaf(admin, NodeLabel::new("roles"), "/roles.do")
            .unwrap();
        bar.add_leaf(root, NodeLabel::new("home"), "/home.do").unwrap();
        bar.add_container(root, NodeLabel::new("empty")).unwrap();
        bar
    }

    #[test]
    fn allow_all_keeps_everything() {
        let bar = sample_bar();
        let children = bar.root().children();
        assert_eq!(AllowAll.filter_menu_nodes(&children), children);
    }

    #[test]
    fn secure_filterer_drops_inaccessible_leaves() {
        let bar = sample_bar();
        let filterer = SecureMenuFilterer::new(DenyList(vec!["/home.do"]));
        let visible = filterer.filter_menu_nodes(&bar.root().children());
        let names: Vec<_> = visible.iter().map(|n| n.name()).collect();
        // "empty" has no leaves at all, so it is hidden too
        assert_eq!(names, vec!["admin"]);
    }

    #[test]
    fn secure_filterer_drops_containers_without_accessible_leaves() {
        let bar = sample_bar();
        let filterer = SecureMenuFilterer::new(DenyList(vec!["/users.do", "/roles.do"]));
        let visible = filterer.filter_menu_nodes(&bar.root().children());
        let names: Vec<_> = visible.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["home"]);
    }

    #[test]
    fn rules_parse_from_toml() {
        let rules = AccessRules::parse_str(
            r#"
[[rule]]
prefix = "/module/user"
permission = "administer users"

[[rule]]
prefix = "/module/user/profile"
permission = "edit own profile"
"#,
        )
        .unwrap();
        assert_eq!(rules.rules().len(), 2);
        assert_eq!(
            rules.required_permission("/module/user/list.do"),
            Some("administer users")
        );
        assert_eq!(
            rules.required_permission("/module/user/profile/edit.do"),
            Some("edit own profile")
        );
        assert_eq!(rules.required_permission("/module/users/list.do"), None);
        assert_eq!(rules.required_permission("/index.do"), None);
    }

    #[test]
    fn principal_access_checks_granted_permissions() {
        let rules = AccessRules::new(vec![AccessRule {
            prefix: "/module/user".to_string(),
            permission: "administer users".to_string(),
        }]);

        let guest = rules.clone().for_principal(HashSet::new(), false);
        assert!(!guest.can_access_url("/module/user/list.do"));
        assert!(guest.can_access_url("/module/news/list.do"));

        let granted = HashSet::from(["administer users".to_string()]);
        let manager = rules.clone().for_principal(granted, false);
        assert!(manager.can_access_url("/module/user/list.do"));

        let admin = rules.for_principal(HashSet::new(), true);
        assert!(admin.can_access_url("/module/user/list.do"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(AccessRules::parse_str("[[rule]]\nprefix = ").is_err());
    }
}
