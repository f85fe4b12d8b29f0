//! Templar - a caching template compiler
//!
//! Templar reads a template and its nested includes from a tree of files,
//! assembles one flattened source string, optionally shrinks it without
//! corrupting embedded directives, and compiles it with [Tera] into a
//! reusable render artifact. Everything sits behind a dependency-aware
//! cache: invalidating one template cascades to every compiled template
//! that transitively includes it.
//!
//! # Architecture Overview
//!
//! A render request flows through the pipeline as:
//! - compiled-store lookup (a cache hit returns the same artifact
//!   immediately, with no I/O)
//! - on miss: the assembler recursively resolves `{% include "id" %}`
//!   directives against the content store, fetching missing files from the
//!   template root and recording child → parent relation edges as it goes
//! - under compression, the flattened source is shrunk; template directives
//!   are protected from the shrinker by content-hashed placeholder tokens
//!   that are restored afterwards
//! - Tera compiles the result, the artifact lands in the compiled store,
//!   and the render data (deep-copied, so the engine never observes the
//!   caller's value) is fed through it
//!
//! # Core Modules
//!
//! - [`pipeline`] - The [`Templar`] entry point: compile, render, invalidate
//! - [`cache`] - Content store, compiled store, and the relation graph that
//!   drives cascading invalidation
//! - [`assembler`] - Recursive include resolution and flattening
//! - [`minify`] - Directive-safe minification and the shrinker trait seams
//! - [`engine`] - The Tera compile/render boundary
//! - [`core`] - Error types shared across the crate
//!
//! # Example
//!
//! ```rust,no_run
//! use templar::{Templar, TemplarOptions};
//!
//! # async fn run() -> templar::Result<()> {
//! let templar = Templar::new(TemplarOptions::new("views")).await?;
//!
//! let data = serde_json::json!({ "user": "ada" });
//! let page = templar.render_file("pages/home.tpl", &data).await?;
//!
//! // A leaf template changed on disk: drop it and everything including it.
//! templar.invalidate("partials/header.tpl");
//! # Ok(())
//! # }
//! ```
//!
//! [Tera]: https://keats.github.io/tera/

pub mod assembler;
pub mod cache;
pub mod constants;
pub mod core;
pub mod engine;
pub mod minify;
pub mod pipeline;
pub mod utils;

pub use crate::core::error::{Result, TemplarError};
pub use engine::CompiledTemplate;
pub use minify::{CssShrinker, JsShrinker, ScriptShrinker, StyleShrinker};
pub use pipeline::{Templar, TemplarOptions};
