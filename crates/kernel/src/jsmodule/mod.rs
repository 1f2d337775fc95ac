//! Client-side script support.
//!
//! This module handles:
//! - Reading per-script dependency manifests
//! - Resolving the transitive, ordered list of scripts a page needs
//! - Bundling those scripts into one cached file

mod bundle;
mod command;
mod error;
mod finder;
mod resolver;

pub use bundle::{BundleCache, Bundler};
pub use command::{DEFAULT_BUNDLE_PATH, ResolveDependencies};
pub use error::DependencyError;
pub use finder::{DependencyFinder, ManifestFinder};
pub use resolver::DependencyResolver;
