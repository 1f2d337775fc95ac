//! Menu registry - collects menu definitions from modules and merges them
//! into a single menu bar.
//!
//! Each module ships a JSON array of [`MenuDefinition`] objects. Relative
//! links are rooted under `/module/<name>/` and `${other}` placeholders
//! resolve to `/module/<other>`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::MenuError;
use super::node::{MenuBar, NodeId, NodeLabel};

/// Suffix of module menu files inside a menus directory.
const MENU_FILE_SUFFIX: &str = ".menu.json";

/// A menu entry declared by a module.
///
/// An entry with a `link` is a leaf and may not have `children`; any other
/// entry is a container whose `children` are built recursively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuDefinition {
    /// Path segment, unique among siblings.
    pub name: String,
    /// Human-readable title (defaults to `name`).
    #[serde(default)]
    pub display_name: String,
    /// Sort weight applied when menus are merged (lower = first).
    #[serde(default)]
    pub position: i32,
    /// Hover text.
    #[serde(default)]
    pub tool_tip: Option<String>,
    /// Navigation target; present for leaves only.
    #[serde(default)]
    pub link: Option<String>,
    /// Nested entries of a container.
    #[serde(default)]
    pub children: Vec<MenuDefinition>,
}

impl MenuDefinition {
    fn label(&self) -> NodeLabel {
        NodeLabel {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            position: self.position,
            tool_tip: self.tool_tip.clone(),
        }
    }
}

/// Build a menu bar named `root` holding the given definitions.
pub fn build_menu_bar(definitions: &[MenuDefinition]) -> Result<MenuBar, MenuError> {
    let mut bar = MenuBar::new("root", "root")?;
    let root = bar.root_id();
    add_definitions(&mut bar, root, definitions)?;
    Ok(bar)
}

fn add_definitions(
    bar: &mut MenuBar,
    parent: NodeId,
    definitions: &[MenuDefinition],
) -> Result<(), MenuError> {
    for definition in definitions {
        match &definition.link {
            Some(_) if !definition.children.is_empty() => {
                let parent_path = bar.node(parent).map(|n| n.path()).unwrap_or_default();
                return Err(MenuError::LinkedContainer {
                    path: format!("{parent_path}/{}", definition.name),
                });
            }
            Some(link) => {
                bar.add_leaf(parent, definition.label(), link.as_str())?;
            }
            None => {
                let id = bar.add_container(parent, definition.label())?;
                add_definitions(bar, id, &definition.children)?;
            }
        }
    }
    Ok(())
}

/// The application-wide menu, merged from every registered module.
#[derive(Debug, Clone)]
pub struct MenuRegistry {
    bar: MenuBar,
    modules: Vec<String>,
    variables: HashMap<String, String>,
}

impl MenuRegistry {
    /// Create a registry with an empty `root` menu bar.
    pub fn new() -> Result<Self, MenuError> {
        Ok(Self {
            bar: MenuBar::new("root", "root")?,
            modules: Vec::new(),
            variables: HashMap::new(),
        })
    }

    /// Create a registry from `(module_name, json_array)` pairs.
    ///
    /// All module names are known before the first merge, so a module may
    /// link into a module registered after it.
    pub fn from_module_menus(menu_jsons: Vec<(String, String)>) -> Result<Self, MenuError> {
        let mut registry = Self::new()?;
        for (module, _) in &menu_jsons {
            registry.declare_module(module);
        }

        for (module, json) in menu_jsons {
            let definitions: Vec<MenuDefinition> =
                serde_json::from_str(&json).map_err(|e| MenuError::InvalidDefinition {
                    module: module.clone(),
                    details: e.to_string(),
                })?;
            registry.register(&module, &definitions)?;
        }

        info!(
            modules = registry.modules.len(),
            nodes = registry.bar.len(),
            "menu registry built"
        );
        Ok(registry)
    }

    /// Load every `<module>.menu.json` file in `dir`, in file name order.
    pub fn load_dir(dir: &Path) -> Result<Self, MenuError> {
        let read_error = |details: String| MenuError::InvalidDefinition {
            module: dir.display().to_string(),
            details,
        };
        let entries = std::fs::read_dir(dir).map_err(|e| read_error(e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| read_error(e.to_string()))?.path();
            let module = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(MENU_FILE_SUFFIX))
                .map(str::to_string);
            if let Some(module) = module {
                files.push((module, path));
            }
        }
        files.sort();

        let mut menu_jsons = Vec::with_capacity(files.len());
        for (module, path) in files {
            debug!(module = %module, path = %path.display(), "reading module menu");
            let json = std::fs::read_to_string(&path).map_err(|e| MenuError::InvalidDefinition {
                module: module.clone(),
                details: format!("failed to read {}: {e}", path.display()),
            })?;
            menu_jsons.push((module, json));
        }
        Self::from_module_menus(menu_jsons)
    }

    /// Merge one module's definitions into the menu bar.
    pub fn register(
        &mut self,
        module: &str,
        definitions: &[MenuDefinition],
    ) -> Result<(), MenuError> {
        self.declare_module(module);
        let module_bar = build_menu_bar(definitions)?;
        let prefix = module_prefix(module);
        let root = self.bar.root_id();
        self.bar.merge(root, &module_bar, &self.variables, &prefix)?;
        debug!(module = %module, entries = definitions.len(), "registered module menu");
        Ok(())
    }

    /// The merged menu bar.
    pub fn menu_bar(&self) -> &MenuBar {
        &self.bar
    }

    /// Registered module names, in registration order.
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    fn declare_module(&mut self, module: &str) {
        if !self.modules.iter().any(|m| m == module) {
            self.modules.push(module.to_string());
            self.variables
                .insert(module.to_string(), module_prefix(module));
        }
    }
}

fn module_prefix(module: &str) -> String {
    format!("module/{module}")
}
