//! Script dependency error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving or bundling script dependencies.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// An item depends, directly or transitively, on itself.
    #[error(
        "circular dependency found: '{item}' is in the list of its ancestors ({chain})",
        chain = .ancestors.join(" -> ")
    )]
    CircularDependency {
        item: String,
        /// Items being expanded when the cycle was found, outermost first.
        ancestors: Vec<String>,
    },

    /// The item is not a usable script identifier.
    #[error("invalid script '{item}': {reason}")]
    InvalidItem { item: String, reason: &'static str },

    /// A dependency manifest exists but could not be read.
    #[error("failed to read dependency manifest {}: {source}", .path.display())]
    ReadManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A dependency manifest is empty, not JSON, or lacks the `js` array.
    #[error("failed to parse dependency manifest {}: {details}", .path.display())]
    InvalidManifest { path: PathBuf, details: String },

    /// A script to be bundled could not be read.
    #[error("failed to read script {}: {source}", .path.display())]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A bundle cache call received empty input.
    #[error("invalid bundle request: {0}")]
    InvalidBundle(&'static str),
}
