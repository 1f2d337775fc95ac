//! Menu error types.
//!
//! Every variant names the node path or module involved so a broken menu
//! definition can be traced back to its source.

use thiserror::Error;

/// Errors raised while building, merging or selecting menus.
#[derive(Debug, Error)]
pub enum MenuError {
    /// A node name was empty or contained whitespace.
    #[error("invalid menu node name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A node id does not belong to this menu bar.
    #[error("menu node #{id} does not exist")]
    UnknownNode { id: usize },

    /// A child was added to a leaf.
    #[error("menu node '{path}' is a leaf and cannot have children")]
    ChildOfLeaf { path: String },

    /// Two siblings share the same name.
    #[error("menu node '{path}' already exists")]
    DuplicateNode { path: String },

    /// A merge tried to combine a leaf with another node of the same name.
    #[error("cannot merge leaf node '{path}' with a node of the same name")]
    LeafConflict { path: String },

    /// A link referenced a `${variable}` that was not supplied.
    #[error("could not find variable '{name}' transforming menu link '{link}'")]
    UnknownVariable { name: String, link: String },

    /// A menu definition declared both a link and children.
    #[error("menu definition '{path}' has a link and children; only leaves carry links")]
    LinkedContainer { path: String },

    /// A module menu could not be parsed.
    #[error("module '{module}': failed to parse menu definition: {details}")]
    InvalidDefinition { module: String, details: String },

    /// The requested menu level was zero.
    #[error("the menu level must be greater than 0")]
    InvalidLevel,

    /// A display entry was built as selected but disabled.
    #[error("menu node '{path}' is selected and cannot be disabled")]
    SelectedDisabled { path: String },
}
