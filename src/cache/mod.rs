//! Dependency-aware template cache.
//!
//! One [`TemplateCache`] composes the three stores the pipeline needs:
//!
//! - the **content store**, mapping a template identifier to its raw
//!   (post-fetch, post-style-shrink) text - the unit of "has this leaf
//!   changed" tracking;
//! - the **compiled store**, mapping an identifier to its compiled render
//!   artifact;
//! - the **relation graph**, directed edges from an included (child)
//!   identifier to every identifier that includes it, used to cascade
//!   invalidation from a changed leaf to every compiled template that
//!   transitively embeds it.
//!
//! The cache lives for the lifetime of one pipeline instance and is only
//! ever mutated behind the pipeline's mutex; there is no cross-instance
//! coherence by design.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::engine::CompiledTemplate;

/// Composed content store, compiled store, and relation graph.
#[derive(Debug, Default)]
pub struct TemplateCache {
    /// Identifier → raw template text
    sources: HashMap<String, String>,
    /// Identifier → compiled render artifact
    compiled: HashMap<String, Arc<CompiledTemplate>>,
    /// Child identifier → set of identifiers whose assembled source embeds it
    relations: HashMap<String, HashSet<String>>,
    /// Compiled-store lookup statistics
    hits: usize,
    misses: usize,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw text for `id`, if the content store holds it. Pure lookup.
    pub fn source(&self, id: &str) -> Option<&str> {
        self.sources.get(id).map(String::as_str)
    }

    /// Insert or overwrite the raw text for `id`.
    pub fn set_source(&mut self, id: &str, text: String) {
        self.sources.insert(id.to_string(), text);
    }

    /// Drop the content entry for `id`. No-op if absent.
    pub fn remove_source(&mut self, id: &str) {
        self.sources.remove(id);
    }

    /// Compiled artifact for `id`, if present.
    ///
    /// Returns a clone of the stored [`Arc`], so repeated hits hand back the
    /// same artifact reference. Updates the hit/miss counters.
    pub fn compiled(&mut self, id: &str) -> Option<Arc<CompiledTemplate>> {
        match self.compiled.get(id) {
            Some(artifact) => {
                self.hits += 1;
                Some(Arc::clone(artifact))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store the compiled artifact for `id`.
    pub fn set_compiled(&mut self, id: &str, artifact: Arc<CompiledTemplate>) {
        self.compiled.insert(id.to_string(), artifact);
    }

    /// Drop the compiled entry for `id`. No-op if absent.
    pub fn remove_compiled(&mut self, id: &str) {
        self.compiled.remove(id);
    }

    /// Record that `parent`'s assembled source embeds `child`.
    ///
    /// Duplicate edges are suppressed; the edge is recorded on every
    /// resolution so the graph stays consistent with every currently
    /// reachable inclusion path, not just the first one discovered.
    pub fn add_relation(&mut self, child: &str, parent: &str) {
        self.relations.entry(child.to_string()).or_default().insert(parent.to_string());
    }

    /// Identifiers whose assembled source embeds `child`. Empty if none.
    pub fn parents_of(&self, child: &str) -> HashSet<String> {
        self.relations.get(child).cloned().unwrap_or_default()
    }

    /// Invalidate `id`: drop its content entry, its compiled entry, the
    /// compiled entries of every transitive parent, and finally its own
    /// parent set.
    ///
    /// The cascade visits each reachable parent at most once, so
    /// diamond-shaped inclusion graphs do no redundant work and a cyclic
    /// graph cannot loop.
    pub fn invalidate(&mut self, id: &str) {
        self.remove_source(id);
        self.remove_compiled(id);

        let mut visited = HashSet::new();
        self.cascade(id, &mut visited);

        self.relations.remove(id);
    }

    /// Invalidate every identifier currently present in the content store.
    ///
    /// Used for blanket resets, e.g. the development-mode watch timer.
    pub fn invalidate_all(&mut self) {
        let ids: Vec<String> = self.sources.keys().cloned().collect();
        for id in ids {
            self.invalidate(&id);
        }
    }

    /// Compiled-store lookup statistics as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    /// Number of entries currently in the content store.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn cascade(&mut self, id: &str, visited: &mut HashSet<String>) {
        let parents: Vec<String> =
            self.relations.get(id).map(|set| set.iter().cloned().collect()).unwrap_or_default();

        for parent in parents {
            if !visited.insert(parent.clone()) {
                continue;
            }
            self.compiled.remove(&parent);
            self.cascade(&parent, visited);
        }
    }
}
