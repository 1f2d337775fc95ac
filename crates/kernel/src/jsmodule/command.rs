//! The resolve-dependencies command.
//!
//! In debug mode the command answers with every script the page must load,
//! in order. Otherwise it answers with a single bundle holding all of them,
//! built once per distinct request and served from the [`BundleCache`].

use std::sync::Arc;

use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::bundle::{BundleCache, Bundler};
use super::error::DependencyError;
use super::finder::DependencyFinder;
use super::resolver::DependencyResolver;

/// URL prefix bundles are served from.
pub const DEFAULT_BUNDLE_PATH: &str = "/module/jsmodule/bundle/";

/// Resolves the scripts requested by a page.
pub struct ResolveDependencies<F> {
    resolver: DependencyResolver<F>,
    bundler: Bundler,
    cache: Arc<BundleCache>,
    debug: bool,
    bundle_path: String,
}

impl<F: DependencyFinder> ResolveDependencies<F> {
    pub fn new(
        resolver: DependencyResolver<F>,
        bundler: Bundler,
        cache: Arc<BundleCache>,
        debug: bool,
    ) -> Self {
        Self {
            resolver,
            bundler,
            cache,
            debug,
            bundle_path: DEFAULT_BUNDLE_PATH.to_string(),
        }
    }

    pub fn with_bundle_path(mut self, bundle_path: impl Into<String>) -> Self {
        self.bundle_path = bundle_path.into();
        self
    }

    /// Answer with `{"js": [...]}`.
    ///
    /// The requested files are sorted first so that debug and bundled mode
    /// resolve the same list.
    pub fn execute(&self, files: &[String]) -> Result<JsonValue, DependencyError> {
        let mut files = files.to_vec();
        files.sort();

        let scripts = if self.debug {
            self.resolver.resolve(&files)?
        } else {
            vec![format!("{}{}", self.bundle_path, self.bundle_key(&files)?)]
        };
        Ok(json!({ "js": scripts }))
    }

    /// Key of the bundle for `files`, building it on a cache miss.
    fn bundle_key(&self, files: &[String]) -> Result<String, DependencyError> {
        if let Some(key) = self.cache.find_key(files)? {
            debug!(key = %key, "bundle cache hit");
            return Ok(key);
        }
        let scripts = self.resolver.resolve(files)?;
        let content = self.bundler.bundle_files(&scripts)?;
        self.cache.store(files, &content)
    }

    /// Content of a bundle previously returned by [`execute`](Self::execute).
    pub fn bundle_content(&self, key: &str) -> Result<Option<String>, DependencyError> {
        self.cache.find_content(key)
    }
}
