//! Transitive script dependency resolution.
//!
//! Expands a list of scripts into every script they need, dependencies
//! first, each listed once. The first occurrence of a script fixes its
//! position.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::error::DependencyError;
use super::finder::DependencyFinder;

/// The chain of items being expanded on the current recursion path.
///
/// Each recursive call pushes a frame on the stack, so sibling expansions
/// never see each other's ancestors.
struct Ancestors<'a> {
    item: &'a str,
    parent: Option<&'a Ancestors<'a>>,
}

impl Ancestors<'_> {
    fn contains(&self, item: &str) -> bool {
        self.iter().any(|a| a == item)
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(Some(self), |a| a.parent).map(|a| a.item)
    }

    /// Outermost ancestor first.
    fn to_vec(&self) -> Vec<String> {
        let mut chain: Vec<String> = self.iter().map(str::to_string).collect();
        chain.reverse();
        chain
    }
}

/// Accumulates resolved items, ignoring duplicates.
#[derive(Default)]
struct Resolved {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl Resolved {
    fn add(&mut self, item: String) {
        if self.seen.insert(item.clone()) {
            self.items.push(item);
        }
    }
}

/// Resolves the full, ordered list of dependencies of a set of scripts.
#[derive(Debug, Clone)]
pub struct DependencyResolver<F> {
    finder: F,
}

impl<F: DependencyFinder> DependencyResolver<F> {
    pub fn new(finder: F) -> Self {
        Self { finder }
    }

    pub fn finder(&self) -> &F {
        &self.finder
    }

    /// Every script needed by `items`, including the items themselves.
    ///
    /// A script always appears after everything it depends on. A circular
    /// dependency aborts the whole resolution.
    pub fn resolve<S: AsRef<str>>(&self, items: &[S]) -> Result<Vec<String>, DependencyError> {
        let resolved = self.resolve_with(items, None)?;
        debug!(requested = items.len(), resolved = resolved.len(), "resolved dependencies");
        Ok(resolved)
    }

    fn resolve_with<S: AsRef<str>>(
        &self,
        items: &[S],
        ancestors: Option<&Ancestors<'_>>,
    ) -> Result<Vec<String>, DependencyError> {
        let mut resolved = Resolved::default();

        for item in items {
            let item = item.as_ref();
            if let Some(chain) = ancestors
                && chain.contains(item)
            {
                return Err(DependencyError::CircularDependency {
                    item: item.to_string(),
                    ancestors: chain.to_vec(),
                });
            }

            let frame = Ancestors {
                item,
                parent: ancestors,
            };
            let dependencies = self.finder.find(item)?;
            trace!(item = %item, dependencies = ?dependencies, "expanding");
            for dependency in self.resolve_with(&dependencies, Some(&frame))? {
                resolved.add(dependency);
            }
            resolved.add(item.to_string());
        }

        Ok(resolved.items)
    }
}
