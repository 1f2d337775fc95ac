//! Lookup of a script's immediate dependencies.
//!
//! Every script `foo/bar.js` that has dependencies ships a manifest
//! `foo/bar.dep.js` next to it:
//!
//! ```json
//! {"js": ["/lib/jquery.js", "/lib/jquery-ui.js"]}
//! ```
//!
//! A script without a manifest has no dependencies.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, trace};

use super::error::DependencyError;

/// Extension of scripts.
const SCRIPT_EXTENSION: &str = ".js";

/// Extension of dependency manifests, replacing [`SCRIPT_EXTENSION`].
const MANIFEST_EXTENSION: &str = ".dep.js";

/// Maps a script to the scripts it needs loaded before it.
pub trait DependencyFinder: Send + Sync {
    /// Immediate dependencies of `item`, in the order they should be
    /// expanded. Empty when `item` has none.
    fn find(&self, item: &str) -> Result<Vec<String>, DependencyError>;
}

impl<T: DependencyFinder + ?Sized> DependencyFinder for &T {
    fn find(&self, item: &str) -> Result<Vec<String>, DependencyError> {
        (**self).find(item)
    }
}

impl<T: DependencyFinder + ?Sized> DependencyFinder for std::sync::Arc<T> {
    fn find(&self, item: &str) -> Result<Vec<String>, DependencyError> {
        (**self).find(item)
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    js: Vec<String>,
}

/// Finder reading `.dep.js` manifests below a root directory.
///
/// Outside debug mode parsed manifests are memoized, so edits to a manifest
/// are only picked up after a restart.
#[derive(Debug)]
pub struct ManifestFinder {
    root: PathBuf,
    cache: Option<DashMap<String, Vec<String>>>,
}

impl ManifestFinder {
    pub fn new(root: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            root: root.into(),
            cache: (!debug).then(DashMap::new),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(&self, item: &str) -> Result<Vec<String>, DependencyError> {
        script_path(&self.root, item)?;
        let stem = item.strip_suffix(SCRIPT_EXTENSION).unwrap_or(item);
        let path = script_path(&self.root, &format!("{stem}{MANIFEST_EXTENSION}"))?;

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(item = %item, "no dependency manifest");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(DependencyError::ReadManifest {
                    path: path.clone(),
                    source,
                });
            }
        };
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| DependencyError::InvalidManifest {
                path: path.clone(),
                details: e.to_string(),
            })?;

        debug!(item = %item, dependencies = manifest.js.len(), "read dependency manifest");
        Ok(manifest.js)
    }
}

impl DependencyFinder for ManifestFinder {
    fn find(&self, item: &str) -> Result<Vec<String>, DependencyError> {
        let Some(cache) = &self.cache else {
            return self.read_manifest(item);
        };
        if let Some(found) = cache.get(item) {
            return Ok(found.clone());
        }
        let found = self.read_manifest(item)?;
        cache.insert(item.to_string(), found.clone());
        Ok(found)
    }
}

/// Location of the script `item` below `root`.
///
/// Items are absolute-looking identifiers such as `/lib/jquery.js`; they must
/// end in `.js` and may not climb out of `root`.
pub(crate) fn script_path(root: &Path, item: &str) -> Result<PathBuf, DependencyError> {
    let invalid = |reason| DependencyError::InvalidItem {
        item: item.to_string(),
        reason,
    };
    if item.is_empty() {
        return Err(invalid("the script cannot be empty"));
    }
    if !item.ends_with(SCRIPT_EXTENSION) {
        return Err(invalid("the script must have a .js extension"));
    }

    let relative = Path::new(item.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(invalid("the script path must stay inside the script root"));
    }
    Ok(root.join(relative))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn script_path_is_rooted() {
        let path = script_path(Path::new("/srv/static"), "/lib/jquery.js").unwrap();
        assert_eq!(path, PathBuf::from("/srv/static/lib/jquery.js"));
    }

    #[test]
    fn script_path_rejects_bad_items() {
        let root = Path::new("/srv/static");
        for item in ["", "file.txt", "/../etc/passwd.js", "/lib/../../x.js"] {
            assert!(
                matches!(script_path(root, item), Err(DependencyError::InvalidItem { .. })),
                "{item} should be rejected"
            );
        }
    }

    #[test]
    fn missing_manifest_means_no_dependencies() {
        let finder = ManifestFinder::new(std::env::temp_dir().join("katari_no_such_root"), true);
        assert!(finder.find("/lib/jquery.js").unwrap().is_empty());
    }
}
