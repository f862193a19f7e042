//! Template compiler.
//!
//! A template is a sequence of literal fragments interleaved with embedded
//! values. Compiling it produces a single SQL string with `$1, $2, ...`
//! markers and the ordered list of parameters those markers stand for.
//!
//! Three placeholder kinds are recognised:
//! - `$(name)` / `$(name):type` written in the text: bound from the argument
//!   bag by name and validated against `type` (default `string`);
//! - [`Embedded::Transformer`]: a callback evaluated at invocation time;
//! - [`Embedded::Raw`]: a value spliced into the text verbatim (no escaping).
//!
//! # Example
//!
//! ```ignore
//! use sqlify::Template;
//!
//! let compiled = Template::new("SELECT * FROM ")
//!     .raw("users")
//!     .text(" WHERE id = $(id):integer AND status = ")
//!     .transform(|args| args.get("status").cloned().unwrap_or("active".into()))
//!     .compile()?;
//!
//! assert_eq!(
//!     compiled.text(),
//!     "SELECT * FROM users WHERE id = $1 AND status = $2"
//! );
//! ```

mod compile;
mod param;

#[cfg(test)]
mod tests;

pub use compile::compile;
pub use param::{Embedded, Param, ParamSource, ParamType, Transformer};

use crate::error::SqlifyResult;
use crate::value::{Args, Value};

/// Builder for a template made of literal fragments and embedded values.
///
/// The builder always holds one more fragment than embedded values.
#[derive(Debug, Clone)]
#[must_use]
pub struct Template {
    fragments: Vec<String>,
    embedded: Vec<Embedded>,
}

impl Template {
    /// Start a template with an initial literal fragment.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            fragments: vec![initial.into()],
            embedded: Vec::new(),
        }
    }

    /// Append literal text (may contain `$(name):type` placeholders).
    pub fn text(mut self, text: &str) -> Self {
        if let Some(last) = self.fragments.last_mut() {
            last.push_str(text);
        }
        self
    }

    /// Embed a value spliced verbatim into the text.
    pub fn raw(self, value: impl Into<Value>) -> Self {
        self.embed(Embedded::Raw(value.into()))
    }

    /// Embed a transformer evaluated against the argument bag on every call.
    pub fn transform<F, V>(self, f: F) -> Self
    where
        F: Fn(&Args) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.embed(Embedded::transformer(f))
    }

    /// Embed an already built value.
    pub fn embed(mut self, value: Embedded) -> Self {
        self.embedded.push(value);
        self.fragments.push(String::new());
        self
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn compile(&self) -> SqlifyResult<CompiledTemplate> {
        compile(&self.fragments, self.embedded.clone())
    }
}

/// The immutable result of compiling a template.
///
/// `text` holds markers `$1..$N`; `params[i]` describes the value for `$i+1`.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    pub(crate) text: String,
    pub(crate) params: Vec<Param>,
}

impl CompiledTemplate {
    /// Compile plain SQL text (e.g. loaded from a file): one fragment, no
    /// embedded values.
    pub fn parse(sql: impl AsRef<str>) -> SqlifyResult<Self> {
        compile(&[sql.as_ref()], Vec::new())
    }

    /// SQL text with positional markers.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Names of the parameters read from the argument bag, in marker order.
    pub fn named_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| !p.is_transformer())
            .map(|p| p.name.as_str())
    }
}
