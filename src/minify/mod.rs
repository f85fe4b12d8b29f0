//! Directive-safe minification.
//!
//! Template directives (`{{ .. }}`, `{% .. %}`, `{# .. #}`) are not valid
//! syntax in the shrinker's target language, so shrinking a flattened
//! template directly would corrupt them. The [`DirectiveMinifier`] protects
//! them with a reversible substitution: every directive span is replaced by a
//! placeholder token derived from a content hash of the span, the shrinker
//! runs over the token-substituted text, and the tokens are swapped back
//! afterwards.
//!
//! The placeholder is shaped like a plain identifier
//! (`tpl_<sha256 hex>`), so the shrinker treats it as an opaque name and
//! passes it through. This protocol assumes the shrinker neither renames nor
//! drops identifiers; the default [`JsShrinker`] (the `minifier` crate) only
//! strips whitespace and comments, which satisfies that contract. A consumer
//! binding an alpha-renaming shrinker through [`ScriptShrinker`] is outside
//! the contract.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

use crate::constants::PLACEHOLDER_PREFIX;
use crate::core::error::{Result, TemplarError};

/// External script shrinker boundary.
///
/// Assumed total except for malformed-input errors, which propagate as
/// compile failures.
pub trait ScriptShrinker: Send + Sync {
    /// Shrink script text, returning the smaller equivalent.
    fn shrink(&self, source: &str) -> Result<String>;
}

/// External stylesheet shrinker boundary. Same contract as
/// [`ScriptShrinker`].
pub trait StyleShrinker: Send + Sync {
    /// Shrink stylesheet text, returning the smaller equivalent.
    fn shrink(&self, source: &str) -> Result<String>;
}

/// Default script shrinker backed by `minifier::js`.
///
/// Strips whitespace and comments only; identifiers survive verbatim, which
/// is what the placeholder protocol requires.
#[derive(Debug, Default)]
pub struct JsShrinker;

impl ScriptShrinker for JsShrinker {
    fn shrink(&self, source: &str) -> Result<String> {
        Ok(minifier::js::minify(source).to_string())
    }
}

/// Default stylesheet shrinker backed by `minifier::css`.
#[derive(Debug, Default)]
pub struct CssShrinker;

impl StyleShrinker for CssShrinker {
    fn shrink(&self, source: &str) -> Result<String> {
        minifier::css::minify(source).map(|minified| minified.to_string()).map_err(|err| {
            TemplarError::ShrinkFailure {
                message: err.to_string(),
            }
        })
    }
}

/// Wraps a script shrinker with the placeholder substitution protocol.
pub struct DirectiveMinifier<'a> {
    shrinker: &'a dyn ScriptShrinker,
}

impl<'a> DirectiveMinifier<'a> {
    /// Create a minifier that protects directives around the given shrinker.
    pub fn new(shrinker: &'a dyn ScriptShrinker) -> Self {
        Self { shrinker }
    }

    /// Shrink `source` with every directive span preserved verbatim.
    ///
    /// # Errors
    ///
    /// Propagates the shrinker's [`TemplarError::ShrinkFailure`] unchanged.
    pub fn minify(&self, source: &str) -> Result<String> {
        let (masked, spans) = mask_directives(source);
        let shrunk = self.shrinker.shrink(&masked)?;
        Ok(restore_directives(shrunk, &spans))
    }
}

/// One regex covers all three directive forms; `(?s)` lets a directive span
/// line breaks.
fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}|\{#.*?#\}").expect("directive pattern is valid")
    })
}

/// Replace every directive span with its placeholder token.
///
/// Identical spans share one token (the token is a pure function of the span
/// text); the returned map carries token → original span for restoration.
pub(crate) fn mask_directives(source: &str) -> (String, HashMap<String, String>) {
    let mut spans: HashMap<String, String> = HashMap::new();

    let masked = directive_regex().replace_all(source, |caps: &Captures<'_>| {
        let span = &caps[0];
        let token = placeholder_token(span);
        spans.entry(token.clone()).or_insert_with(|| span.to_string());
        token
    });

    (masked.into_owned(), spans)
}

/// Swap every placeholder token back to its original directive span.
pub(crate) fn restore_directives(shrunk: String, spans: &HashMap<String, String>) -> String {
    let mut restored = shrunk;
    for (token, span) in spans {
        restored = restored.replace(token.as_str(), span);
    }
    restored
}

/// Identifier-shaped stand-in for a directive span, keyed by content hash.
fn placeholder_token(span: &str) -> String {
    let digest = Sha256::digest(span.as_bytes());
    format!("{}{}", PLACEHOLDER_PREFIX, hex::encode(digest))
}
