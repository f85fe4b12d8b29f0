//! Integration test suite for templar.
//!
//! End-to-end tests that build real template trees on disk and drive the
//! pipeline through its public entry points.
//!
//! # Running
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **flatten**: include resolution, stylesheet embedding, missing and
//!   circular includes
//! - **invalidation**: cascading invalidation, diamond graphs, blanket
//!   resets, watch mode
//! - **compile**: compiled-store behavior, compression paths, precompile,
//!   error propagation

// Shared test utilities (from the parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod flatten;
