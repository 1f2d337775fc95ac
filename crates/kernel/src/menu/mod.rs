//! Menu system for navigation.
//!
//! Modules contribute menu definitions which are merged into one tree and
//! then displayed level by level:
//! - Tree construction and merging of module menus
//! - Security filtering of the nodes the current user may see
//! - Selection of the entries to display for the current path

mod display;
mod error;
mod filter;
mod node;
mod registry;

pub use display::{DEFAULT_FALLBACK_LINK, MenuNodeDisplay, MenuSelector};
pub use error::MenuError;
pub use filter::{
    AccessRule, AccessRules, AllowAll, MenuAccessFilterer, PrincipalAccess, SecureMenuFilterer,
    UrlAccess,
};
pub use node::{MenuBar, MenuNode, NodeId, NodeLabel};
pub use registry::{MenuDefinition, MenuRegistry, build_menu_bar};
