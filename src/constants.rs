//! Global constants used throughout the templar codebase.
//!
//! Centralizing extensions, the placeholder prefix, and timing parameters
//! keeps the magic values discoverable and consistent across modules.

use std::time::Duration;

/// File extension that marks a file as a directive-bearing template.
///
/// Files with any other extension participate in inclusion as opaque text
/// and are never scanned for directives.
pub const TEMPLATE_EXTENSION: &str = "tpl";

/// File extension that marks a file as a stylesheet.
///
/// Stylesheet content is run through the style shrinker at fetch time,
/// before it enters the content store.
pub const STYLE_EXTENSION: &str = "css";

/// Prefix for the content-hashed placeholder tokens that protect template
/// directives during minification.
///
/// The prefix plus a hex digest forms a plain identifier in the shrinker's
/// target language, so the shrinker passes it through untouched.
pub const PLACEHOLDER_PREFIX: &str = "tpl_";

/// Interval between blanket cache resets in watch mode (1 second).
///
/// Watch mode trades compile work for freshness during development; the
/// interval matches the refresh cadence an editing developer notices.
pub const WATCH_CLEAR_INTERVAL: Duration = Duration::from_secs(1);
