//! Error types for sqlify

use crate::template::ParamType;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sqlify operations
pub type SqlifyResult<T> = Result<T, SqlifyError>;

/// Error types for template compilation, binding and execution
#[derive(Debug, Error)]
pub enum SqlifyError {
    /// A named placeholder has no entry in the argument bag
    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    /// A bound value does not satisfy the declared placeholder type
    #[error("Parameter {name} must be {}: {message}", .expected.describe())]
    TypeValidation {
        name: String,
        expected: ParamType,
        message: String,
    },

    /// A textual value for a `json` placeholder is not valid JSON
    #[error("Parameter {name} must be valid JSON: {message}")]
    MalformedJson { name: String, message: String },

    /// The template itself is malformed (fragment/value mismatch, unknown type tag)
    #[error("Template error: {0}")]
    Template(String),

    /// Invalid use of a model or identifier
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query execution error reported by Postgres
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Failed to read a template or schema file
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A query hook aborted execution
    #[error("Query aborted: {0}")]
    Aborted(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlifyError {
    /// Create a missing parameter error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create a type validation error
    pub fn type_validation(
        name: impl Into<String>,
        expected: ParamType,
        message: impl Into<String>,
    ) -> Self {
        Self::TypeValidation {
            name: name.into(),
            expected,
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a missing parameter error
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingParameter { .. })
    }

    /// Check if this is a type validation error.
    ///
    /// Malformed JSON counts as a type validation failure.
    pub fn is_type_validation(&self) -> bool {
        matches!(self, Self::TypeValidation { .. } | Self::MalformedJson { .. })
    }

    /// Check if this is a malformed JSON error
    pub fn is_malformed_json(&self) -> bool {
        matches!(self, Self::MalformedJson { .. })
    }

    /// Name of the parameter this error refers to, if any.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::MissingParameter { name }
            | Self::TypeValidation { name, .. }
            | Self::MalformedJson { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlifyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
