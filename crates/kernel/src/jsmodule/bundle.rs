//! Script bundling and the in-process bundle cache.

use std::path::PathBuf;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::error::DependencyError;
use super::finder::script_path;

/// Minifies scripts and concatenates them into a single bundle.
#[derive(Debug, Clone)]
pub struct Bundler {
    root: PathBuf,
}

impl Bundler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Minify `resources` and concatenate them in order, each preceded by a
    /// banner naming its source.
    pub fn bundle_files<S: AsRef<str>>(&self, resources: &[S]) -> Result<String, DependencyError> {
        let mut bundle = String::new();
        for resource in resources {
            let resource = resource.as_ref();
            let path = script_path(&self.root, resource)?;
            let content = std::fs::read_to_string(&path)
                .map_err(|source| DependencyError::ReadScript { path, source })?;

            bundle.push_str("/***************************************************\n");
            bundle.push_str(&format!(" * Bundled from '{resource}'\n"));
            bundle.push_str(" ***************************************************/\n");
            bundle.push_str(&minify(&content));
            bundle.push('\n');
        }
        debug!(scripts = resources.len(), bytes = bundle.len(), "bundled scripts");
        Ok(bundle)
    }
}

/// Strips comments and redundant whitespace from one script.
fn minify(source: &str) -> String {
    minifier::js::minify(source).to_string()
}

/// Bundles kept in memory, addressed by a key derived from their content.
///
/// The key of a bundle is the hex SHA-256 of its content followed by `.js`,
/// so identical bundles share a key. Keys are always 67 characters long; the
/// MD5 keys of earlier releases were 35.
#[derive(Debug, Default)]
pub struct BundleCache {
    /// Requested file list -> bundle key.
    keys: DashMap<Vec<String>, String>,
    /// Bundle key -> bundle content.
    contents: DashMap<String, String>,
}

impl BundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the bundle previously stored for `files`.
    pub fn find_key(&self, files: &[String]) -> Result<Option<String>, DependencyError> {
        if files.is_empty() {
            return Err(DependencyError::InvalidBundle("the file list cannot be empty"));
        }
        Ok(self.keys.get(files).map(|key| key.clone()))
    }

    /// Store the bundle built for `files` and return its key.
    pub fn store(&self, files: &[String], content: &str) -> Result<String, DependencyError> {
        if files.is_empty() {
            return Err(DependencyError::InvalidBundle("the file list cannot be empty"));
        }
        if content.is_empty() {
            return Err(DependencyError::InvalidBundle("the bundle content cannot be empty"));
        }

        let key = format!("{}.js", hex::encode(Sha256::digest(content.as_bytes())));
        self.contents.insert(key.clone(), content.to_string());
        self.keys.insert(files.to_vec(), key.clone());
        info!(key = %key, files = files.len(), "stored script bundle");
        Ok(key)
    }

    /// Content of the bundle stored under `key`.
    pub fn find_content(&self, key: &str) -> Result<Option<String>, DependencyError> {
        if key.is_empty() {
            return Err(DependencyError::InvalidBundle("the bundle key cannot be empty"));
        }
        Ok(self.contents.get(key).map(|content| content.clone()))
    }

    /// Number of distinct bundles held.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
