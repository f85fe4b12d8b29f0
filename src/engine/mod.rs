//! The Tera compile/render boundary.
//!
//! The pipeline treats the templating engine as an external collaborator: it
//! hands over one flattened, directive-bearing source string and gets back an
//! opaque artifact that turns a data value into rendered text. This module is
//! the whole of that boundary. Engine errors are flattened into one-line
//! messages and surfaced as [`TemplarError::CompileFailure`]; nothing else in
//! the crate touches Tera.

use serde_json::Value;
use tera::{Context, Tera};

use crate::core::error::{Result, TemplarError};

/// A compiled render artifact: one parsed template, ready to be invoked any
/// number of times.
///
/// Artifacts are cheap to share (`Arc<CompiledTemplate>` in the compiled
/// store) and rendering takes `&self`, so a cached artifact can serve
/// repeated renders without recompilation.
#[derive(Debug)]
pub struct CompiledTemplate {
    tera: Tera,
    id: String,
}

impl CompiledTemplate {
    /// Compile flattened source text under the given identifier.
    ///
    /// Autoescaping is disabled: the output language of a template is script
    /// or style text, not HTML, and escaping would corrupt it.
    ///
    /// # Errors
    ///
    /// [`TemplarError::CompileFailure`] when Tera rejects the source.
    pub fn compile(id: &str, source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(id, source).map_err(|err| TemplarError::CompileFailure {
            id: id.to_string(),
            message: flatten_engine_error(&err),
        })?;

        Ok(Self {
            tera,
            id: id.to_string(),
        })
    }

    /// Invoke the artifact with a data value, producing rendered text.
    ///
    /// The caller's value is cloned before the engine sees it, so the engine
    /// can never observe or mutate caller state across repeated renders.
    /// `Null` renders with an empty context; any other non-object value is
    /// rejected, since the engine binds variables by name.
    ///
    /// # Errors
    ///
    /// [`TemplarError::CompileFailure`] when the engine fails at render time
    /// (missing variables, failing filters).
    pub fn render(&self, data: &Value) -> Result<String> {
        let context = match data {
            Value::Null => Context::new(),
            Value::Object(_) => {
                Context::from_value(data.clone()).map_err(|err| TemplarError::CompileFailure {
                    id: self.id.clone(),
                    message: flatten_engine_error(&err),
                })?
            }
            _ => {
                return Err(TemplarError::CompileFailure {
                    id: self.id.clone(),
                    message: "render data must be a JSON object or null".to_string(),
                });
            }
        };

        self.tera.render(&self.id, &context).map_err(|err| TemplarError::CompileFailure {
            id: self.id.clone(),
            message: flatten_engine_error(&err),
        })
    }

    /// The normalized identifier this artifact was compiled under.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Walk a Tera error chain into a single line.
///
/// Tera reports the interesting cause (an undefined variable, a parse
/// position) one or two levels down the `source()` chain; the top-level
/// message alone is usually just "Failed to render 'x'".
fn flatten_engine_error(error: &tera::Error) -> String {
    use std::error::Error as _;

    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        messages.push(err.to_string());
        source = err.source();
    }

    messages.join(": ")
}
