//! Core types shared across the templar pipeline.
//!
//! Currently this is the error taxonomy; every fallible operation in the
//! crate reports a [`TemplarError`](error::TemplarError).

pub mod error;

pub use error::{Result, TemplarError};
