use crate::error::SqlifyError;
use crate::value::{Args, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Declared type of a named placeholder (`$(name):type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// No validation. The default when no `:type` suffix is given.
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Json,
}

impl ParamType {
    pub const ALL: [ParamType; 6] = [
        ParamType::String,
        ParamType::Integer,
        ParamType::Float,
        ParamType::Boolean,
        ParamType::Date,
        ParamType::Json,
    ];

    /// Parse a type tag as written in a template. Tags are case-insensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }

    /// The tag as written in templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
            ParamType::Json => "json",
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            ParamType::String => "a string",
            ParamType::Integer => "an integer",
            ParamType::Float => "a number",
            ParamType::Boolean => "a boolean",
            ParamType::Date => "a valid date",
            ParamType::Json => "valid JSON",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = SqlifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| {
            SqlifyError::template(format!(
                "unknown parameter type '{s}' (expected one of: string, integer, float, boolean, date, json)"
            ))
        })
    }
}

/// A callback embedded in a template, evaluated against the argument bag at
/// every invocation. Its output is bound as-is, without type validation.
#[derive(Clone)]
pub struct Transformer(Arc<dyn Fn(&Args) -> Value + Send + Sync>);

impl Transformer {
    pub fn new<F, V>(f: F) -> Self
    where
        F: Fn(&Args) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self(Arc::new(move |args| f(args).into()))
    }

    pub fn call(&self, args: &Args) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transformer(..)")
    }
}

/// A value interleaved with the literal fragments of a template.
#[derive(Debug, Clone)]
pub enum Embedded {
    /// Spliced into the text as its display form. Not escaped.
    Raw(Value),
    /// Bound as a positional parameter computed at invocation time.
    Transformer(Transformer),
}

impl Embedded {
    pub fn raw(v: impl Into<Value>) -> Self {
        Embedded::Raw(v.into())
    }

    pub fn transformer<F, V>(f: F) -> Self
    where
        F: Fn(&Args) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Embedded::Transformer(Transformer::new(f))
    }
}

/// Where a parameter's value comes from at bind time.
#[derive(Debug, Clone)]
pub enum ParamSource {
    /// Read from the argument bag by the parameter name.
    Named,
    /// Computed by the transformer from the whole argument bag.
    Transformer(Transformer),
}

/// A positional parameter of a compiled template. Index `i` binds to `$i+1`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: ParamType,
    pub source: ParamSource,
}

impl Param {
    pub(crate) fn named(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            source: ParamSource::Named,
        }
    }

    pub(crate) fn transformer(slot: usize, transformer: Transformer) -> Self {
        Self {
            name: format!("__transform_{slot}__"),
            ty: ParamType::String,
            source: ParamSource::Transformer(transformer),
        }
    }

    pub fn is_transformer(&self) -> bool {
        matches!(self.source, ParamSource::Transformer(_))
    }
}
