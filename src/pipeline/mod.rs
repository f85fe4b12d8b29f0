//! Pipeline orchestration: the [`Templar`] entry point.
//!
//! A `Templar` owns one dependency-aware cache and binds the external
//! collaborators together: the assembler flattens, the directive-safe
//! minifier (or the style shrinker, for stylesheets) compresses, Tera
//! compiles, and the compiled store serves repeat requests. Construction is
//! all-or-nothing: an invalid option set returns an error and no
//! partially-initialized pipeline.
//!
//! Instances are independent by design. Two pipelines over the same root
//! each hold their own cache with no cross-instance coherence, since each
//! may carry different compression or precompile configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::task::JoinHandle;
use walkdir::WalkDir;

use crate::assembler::Assembler;
use crate::cache::TemplateCache;
use crate::constants::WATCH_CLEAR_INTERVAL;
use crate::core::error::{Result, TemplarError};
use crate::engine::CompiledTemplate;
use crate::minify::{CssShrinker, DirectiveMinifier, JsShrinker, ScriptShrinker, StyleShrinker};
use crate::utils;

/// Flat option set for pipeline construction.
///
/// `root` is the only required option; everything else has the same
/// defaults a production deployment wants (compression on, development
/// conveniences off).
#[derive(Debug, Clone)]
pub struct TemplarOptions {
    /// Base directory all template identifiers are resolved against.
    /// Required; construction fails without it.
    pub root: Option<PathBuf>,
    /// Shrink compiled output (directive-safe script minification for
    /// templates, style shrinking for stylesheets). Default `true`.
    pub compress: bool,
    /// Clear the whole cache on a fixed interval, so edits on disk show up
    /// without restarts. Development convenience; default `false`.
    pub watch: bool,
    /// Eagerly compile every discoverable template under `root` during
    /// construction. Default `false`.
    pub precompile: bool,
    /// Emit the operator-facing compile and timing lines at `info` level
    /// instead of `debug`. Default `false`.
    pub logging: bool,
}

impl Default for TemplarOptions {
    fn default() -> Self {
        Self {
            root: None,
            compress: true,
            watch: false,
            precompile: false,
            logging: false,
        }
    }
}

impl TemplarOptions {
    /// Options with the required root set and everything else at its
    /// default.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Toggle output compression.
    #[must_use]
    pub fn compress(mut self, on: bool) -> Self {
        self.compress = on;
        self
    }

    /// Toggle the periodic blanket cache reset.
    #[must_use]
    pub fn watch(mut self, on: bool) -> Self {
        self.watch = on;
        self
    }

    /// Toggle eager compilation of every template under the root.
    #[must_use]
    pub fn precompile(mut self, on: bool) -> Self {
        self.precompile = on;
        self
    }

    /// Toggle operator-facing log lines.
    #[must_use]
    pub fn logging(mut self, on: bool) -> Self {
        self.logging = on;
        self
    }
}

/// The template compilation pipeline.
///
/// See the [crate-level documentation](crate) for the data flow. All entry
/// points take `&self`; cache access is serialized behind an internal mutex
/// that is never held across an await point.
pub struct Templar {
    root: PathBuf,
    compress: bool,
    logging: bool,
    cache: Arc<Mutex<TemplateCache>>,
    script_shrinker: Arc<dyn ScriptShrinker>,
    style_shrinker: Arc<dyn StyleShrinker>,
    watch_task: Option<JoinHandle<()>>,
}

impl Templar {
    /// Construct a pipeline with the default shrinkers.
    ///
    /// # Errors
    ///
    /// [`TemplarError::Config`] when `root` is missing or not a directory;
    /// any compile error from precompilation when
    /// [`precompile`](TemplarOptions::precompile) is set.
    pub async fn new(options: TemplarOptions) -> Result<Self> {
        Self::with_shrinkers(options, Arc::new(JsShrinker), Arc::new(CssShrinker)).await
    }

    /// Construct a pipeline with caller-provided shrinkers.
    ///
    /// The shrinkers are external collaborators; binding different ones
    /// changes what "compress" means but nothing else about the pipeline.
    pub async fn with_shrinkers(
        options: TemplarOptions,
        script_shrinker: Arc<dyn ScriptShrinker>,
        style_shrinker: Arc<dyn StyleShrinker>,
    ) -> Result<Self> {
        let root = options.root.clone().ok_or_else(|| TemplarError::Config {
            message: "template root directory is required".to_string(),
        })?;
        if !root.is_dir() {
            return Err(TemplarError::Config {
                message: format!("template root '{}' is not a directory", root.display()),
            });
        }

        let cache = Arc::new(Mutex::new(TemplateCache::new()));

        let watch_task = options.watch.then(|| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(WATCH_CLEAR_INTERVAL);
                // The first tick completes immediately; skip it so a fresh
                // pipeline is not cleared before it serves anything.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    lock(&cache).invalidate_all();
                    tracing::debug!("watch interval elapsed, cache cleared");
                }
            })
        });

        let templar = Self {
            root,
            compress: options.compress,
            logging: options.logging,
            cache,
            script_shrinker,
            style_shrinker,
            watch_task,
        };

        if options.precompile {
            let started = Instant::now();
            templar.precompile_root().await?;
            templar
                .log_line(format_args!("precompile finished in {}ms", started.elapsed().as_millis()));
        }

        Ok(templar)
    }

    /// Compile a template, serving from the compiled store when possible.
    ///
    /// A cache hit returns the same artifact reference as the previous call
    /// with no work performed. On a miss the pipeline assembles, optionally
    /// compresses, compiles, stores, and returns; on any error nothing is
    /// written to the compiled store.
    ///
    /// # Errors
    ///
    /// [`TemplarError::TemplateNotFound`], [`TemplarError::CircularInclude`],
    /// [`TemplarError::ShrinkFailure`], or [`TemplarError::CompileFailure`],
    /// per stage.
    pub async fn compile_file(&self, path: impl AsRef<Path>) -> Result<Arc<CompiledTemplate>> {
        let id = utils::normalize_id(&self.root, path.as_ref());

        if let Some(artifact) = lock(&self.cache).compiled(&id) {
            return Ok(artifact);
        }

        self.log_line(format_args!("[{}] compile", id));

        let flattened =
            Assembler::new(&self.root, &self.cache, self.style_shrinker.as_ref())
                .flatten(&id)
                .await?;

        let started = Instant::now();
        let prepared = if self.compress {
            if utils::is_stylesheet(&id) {
                self.style_shrinker.shrink(&flattened)?
            } else {
                DirectiveMinifier::new(self.script_shrinker.as_ref()).minify(&flattened)?
            }
        } else {
            flattened.clone()
        };

        if self.compress {
            let percent = if flattened.is_empty() {
                100
            } else {
                prepared.len() * 100 / flattened.len()
            };
            self.log_line(format_args!(
                "[{}] {} -> {} bytes, {}%, {}ms",
                id,
                flattened.len(),
                prepared.len(),
                percent,
                started.elapsed().as_millis()
            ));
        }

        let artifact = Arc::new(CompiledTemplate::compile(&id, &prepared)?);
        lock(&self.cache).set_compiled(&id, Arc::clone(&artifact));

        Ok(artifact)
    }

    /// Render a template with a data value.
    ///
    /// The data is deep-copied before the engine sees it, so concurrent or
    /// repeated renders can never observe engine-side mutation of caller
    /// state.
    ///
    /// # Errors
    ///
    /// Everything [`compile_file`](Self::compile_file) can return, plus
    /// [`TemplarError::CompileFailure`] for engine render-time failures.
    pub async fn render_file(&self, path: impl AsRef<Path>, data: &Value) -> Result<String> {
        let artifact = self.compile_file(path).await?;
        artifact.render(data)
    }

    /// Drop one template's content and compiled entries, cascading to every
    /// compiled template that transitively includes it.
    pub fn invalidate(&self, path: impl AsRef<Path>) {
        let id = utils::normalize_id(&self.root, path.as_ref());
        lock(&self.cache).invalidate(&id);
        tracing::debug!("[{}] invalidated", id);
    }

    /// Blanket reset: invalidate every cached identifier.
    pub fn invalidate_all(&self) {
        lock(&self.cache).invalidate_all();
        tracing::debug!("cache cleared");
    }

    /// The template root this pipeline resolves identifiers against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compiled-store lookup statistics as `(hits, misses)`.
    pub fn cache_stats(&self) -> (usize, usize) {
        lock(&self.cache).stats()
    }

    /// Walk the root and compile every template file found.
    async fn precompile_root(&self) -> Result<()> {
        let mut templates = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let id = utils::normalize_id(&self.root, entry.path());
            if utils::is_template(&id) {
                templates.push(id);
            }
        }

        for id in templates {
            self.compile_file(&id).await?;
            self.log_line(format_args!("[{}] precompiled", id));
        }

        Ok(())
    }

    /// Operator-facing lines go to `info` when logging is enabled, `debug`
    /// otherwise.
    fn log_line(&self, args: fmt::Arguments<'_>) {
        if self.logging {
            tracing::info!("{}", args);
        } else {
            tracing::debug!("{}", args);
        }
    }
}

// The shrinker trait objects carry no useful state to print; report the
// configuration the pipeline was built with.
impl fmt::Debug for Templar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templar")
            .field("root", &self.root)
            .field("compress", &self.compress)
            .field("logging", &self.logging)
            .finish_non_exhaustive()
    }
}

impl Drop for Templar {
    fn drop(&mut self) {
        if let Some(task) = &self.watch_task {
            task.abort();
        }
    }
}

fn lock(cache: &Mutex<TemplateCache>) -> MutexGuard<'_, TemplateCache> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}
