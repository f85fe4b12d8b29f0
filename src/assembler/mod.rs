//! Recursive include resolution.
//!
//! The assembler turns a top-level template identifier into one fully
//! flattened source string: every `{% include "id" %}` directive is replaced
//! by the included template's (recursively flattened) content. Include
//! directives are resolved here, never by the templating engine - the engine
//! receives source with no include directives left in it.
//!
//! As it descends, the assembler populates the relation graph with every
//! (child, parent) edge it resolves, which is what makes cascading
//! invalidation possible later. Content is fetched from the backing store at
//! most once per identifier: subsequent assemblies hit the content store.
//!
//! The only suspension point is the backing-store read; all cache access is
//! synchronous and the cache lock is never held across an await.

use std::future::Future;
use std::ops::Range;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use regex::Regex;

use crate::cache::TemplateCache;
use crate::core::error::{Result, TemplarError};
use crate::minify::StyleShrinker;
use crate::utils;

/// Include directives are the one piece of directive syntax the assembler
/// owns. Both quote styles are accepted, with optional whitespace trim
/// markers.
fn include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{%-?\s*include\s+['"]([^'"]+)['"]\s*-?%\}"#)
            .expect("include pattern is valid")
    })
}

type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

/// One flattening pass over a top-level template.
///
/// An assembler is constructed per compile; the `visiting` stack it carries
/// is the per-compile visited-path set that turns a circular include into a
/// [`TemplarError::CircularInclude`] instead of unbounded recursion.
pub struct Assembler<'a> {
    root: &'a Path,
    cache: &'a Mutex<TemplateCache>,
    style_shrinker: &'a dyn StyleShrinker,
    visiting: Vec<String>,
}

impl<'a> Assembler<'a> {
    /// Create an assembler for one flattening pass.
    pub fn new(
        root: &'a Path,
        cache: &'a Mutex<TemplateCache>,
        style_shrinker: &'a dyn StyleShrinker,
    ) -> Self {
        Self {
            root,
            cache,
            style_shrinker,
            visiting: Vec::new(),
        }
    }

    /// Produce the fully flattened source for `id`.
    ///
    /// # Errors
    ///
    /// - [`TemplarError::TemplateNotFound`] when `id` or any include target
    ///   is missing from the backing store. Identifiers already read stay
    ///   cached; only the in-flight assembly is abandoned.
    /// - [`TemplarError::CircularInclude`] when a template transitively
    ///   includes itself.
    /// - [`TemplarError::ShrinkFailure`] when a fetched stylesheet fails the
    ///   style shrinker.
    pub async fn flatten(mut self, id: &str) -> Result<String> {
        self.read(id.to_string(), None).await
    }

    /// Resolve one identifier: record the relation edge, fetch-or-reuse the
    /// raw text, and substitute include directives recursively.
    fn read<'s>(&'s mut self, id: String, parent: Option<String>) -> ReadFuture<'s> {
        Box::pin(async move {
            if let Some(parent) = &parent {
                // Recorded on every resolution, not just the first, so the
                // graph tracks every currently reachable inclusion path.
                lock(self.cache).add_relation(&id, parent);
            }

            if self.visiting.iter().any(|seen| seen == &id) {
                let mut chain = self.visiting.clone();
                chain.push(id);
                return Err(TemplarError::CircularInclude {
                    chain: chain.join(" -> "),
                });
            }

            let cached = lock(self.cache).source(&id).map(str::to_string);
            let mut text = match cached {
                Some(cached) => cached,
                None => self.fetch(&id).await?,
            };

            // Plain stylesheets and other opaque files participate in
            // inclusion but are not directive-scanned.
            if !utils::is_template(&id) {
                return Ok(text);
            }

            self.visiting.push(id.clone());
            let result = self.resolve_includes(&mut text, &id).await;
            self.visiting.pop();
            result?;

            Ok(text)
        })
    }

    /// Read raw bytes from the backing store, style-shrinking stylesheets,
    /// and populate the content store.
    async fn fetch(&mut self, id: &str) -> Result<String> {
        let path = self.root.join(id);
        tracing::debug!("[{}] fetching from {}", id, path.display());

        let raw = tokio::fs::read_to_string(&path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                TemplarError::TemplateNotFound { id: id.to_string() }
            } else {
                TemplarError::Io(err)
            }
        })?;

        let text =
            if utils::is_stylesheet(id) { self.style_shrinker.shrink(&raw)? } else { raw };

        lock(self.cache).set_source(id, text.clone());
        Ok(text)
    }

    /// Substitute include directives in one pass over the pre-substitution
    /// text.
    ///
    /// Only directives present in the original text are resolved.
    /// Substituted content is never rescanned: template children arrive
    /// already flattened by the recursive call, and opaque children stay
    /// literal even when their text happens to look like a directive.
    async fn resolve_includes(&mut self, text: &mut String, id: &str) -> Result<()> {
        let targets: Vec<(Range<usize>, String)> = include_regex()
            .captures_iter(text)
            .filter_map(|caps| {
                let span = caps.get(0)?;
                let child = caps.get(1)?;
                Some((span.range(), child.as_str().to_string()))
            })
            .collect();

        if targets.is_empty() {
            return Ok(());
        }

        let mut assembled = String::with_capacity(text.len());
        let mut cursor = 0;
        for (range, child) in targets {
            assembled.push_str(&text[cursor..range.start]);
            let resolved = self.read(child, Some(id.to_string())).await?;
            assembled.push_str(&resolved);
            cursor = range.end;
        }
        assembled.push_str(&text[cursor..]);

        *text = assembled;
        Ok(())
    }
}

/// Take the cache lock, recovering the guard if a previous holder panicked.
fn lock(cache: &Mutex<TemplateCache>) -> MutexGuard<'_, TemplateCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}
