//! Error handling for the templar pipeline.
//!
//! The taxonomy is deliberately small: every failure a caller of
//! [`compile_file`](crate::Templar::compile_file) or
//! [`render_file`](crate::Templar::render_file) can observe is one of the
//! variants below. Runtime errors are reported to the immediate caller and
//! never retried; none of them corrupt cache state beyond leaving the failed
//! identifier uncompiled. [`Config`](TemplarError::Config) is fatal at
//! construction - no partially-initialized pipeline is ever returned.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TemplarError>;

/// The error type for all templar operations.
#[derive(Error, Debug)]
pub enum TemplarError {
    /// A top-level template or an include target does not exist under the
    /// template root.
    #[error("template '{id}' not found under the template root")]
    TemplateNotFound {
        /// Normalized identifier of the missing template
        id: String,
    },

    /// A template transitively includes itself.
    ///
    /// The assembler tracks the chain of identifiers it is currently
    /// resolving; revisiting one of them aborts the assembly instead of
    /// recursing without bound.
    #[error("circular include detected: {chain}")]
    CircularInclude {
        /// The inclusion chain, root first, ending at the repeated id
        chain: String,
    },

    /// The templating engine rejected the flattened source, or a compiled
    /// artifact failed at render time.
    #[error("failed to compile template '{id}': {message}")]
    CompileFailure {
        /// Identifier of the template that failed
        id: String,
        /// Engine error chain, flattened into one line
        message: String,
    },

    /// A script or style shrinker rejected its input.
    #[error("minification failed: {message}")]
    ShrinkFailure {
        /// Shrinker error description
        message: String,
    },

    /// Pipeline construction was given an unusable option set.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// An I/O failure other than a missing template (permissions, transient
    /// filesystem errors, broken symlinks during discovery).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
