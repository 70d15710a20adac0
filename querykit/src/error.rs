//! Error types for query compilation, result decoding and configuration.
//!
//! Every compiler and decoder entry point returns one of these as a
//! recoverable value. Nothing in this crate retries or substitutes a
//! placeholder result when rendering or decoding fails.

use thiserror::Error;

use crate::value::Value;

/// Errors raised while rendering components into a statement.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Two fragments bound the same parameter name to different values.
    #[error(
        "parameter '${name}' is bound to conflicting values {existing} and {incoming}{}",
        clause_suffix(.clause)
    )]
    CompilationConflict {
        clause: Option<usize>,
        name: String,
        existing: Value,
        incoming: Value,
    },

    /// A component could not produce a renderable fragment.
    #[error("cannot compile {component}: {message}{}", clause_suffix(.clause))]
    CompilationFailure {
        clause: Option<usize>,
        component: &'static str,
        message: String,
    },

    /// A vector search was given a query vector of the wrong length.
    #[error("vector for {type_name}.{column} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        type_name: String,
        column: String,
        expected: usize,
        actual: usize,
    },

    /// The domain type metadata does not declare a referenced property.
    #[error("{type_name} does not declare property '{property}'")]
    MissingColumnMapping { type_name: String, property: String },
}

fn clause_suffix(clause: &Option<usize>) -> String {
    match clause {
        Some(index) => format!(" (clause {})", index),
        None => String::new(),
    }
}

impl QueryError {
    pub(crate) fn failure(component: &'static str, message: impl Into<String>) -> Self {
        QueryError::CompilationFailure {
            clause: None,
            component,
            message: message.into(),
        }
    }

    /// Attach the index of the top-level clause that produced this error.
    ///
    /// An index that is already present is kept, so errors raised inside
    /// nested sub-queries keep pointing at the outermost clause.
    pub fn at_clause(self, index: usize) -> Self {
        match self {
            QueryError::CompilationConflict {
                clause: None,
                name,
                existing,
                incoming,
            } => QueryError::CompilationConflict {
                clause: Some(index),
                name,
                existing,
                incoming,
            },
            QueryError::CompilationFailure {
                clause: None,
                component,
                message,
            } => QueryError::CompilationFailure {
                clause: Some(index),
                component,
                message,
            },
            other => other,
        }
    }

    /// The clause index recorded on this error, if any.
    pub fn clause(&self) -> Option<usize> {
        match self {
            QueryError::CompilationConflict { clause, .. }
            | QueryError::CompilationFailure { clause, .. } => *clause,
            _ => None,
        }
    }
}

/// Errors raised while converting engine rows into domain records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("field '{field}' is not optional but the engine returned null")]
    NullViolation { field: String },

    #[error("query returned no results")]
    NoResults,

    #[error("missing column '{name}' in query result")]
    MissingColumn { name: String },

    #[error("cannot build {type_name}: {message}")]
    Deserialize { type_name: String, message: String },
}

impl DecodeError {
    pub(crate) fn mismatch(field: &str, expected: impl Into<String>, found: &Value) -> Self {
        DecodeError::TypeMismatch {
            field: field.to_string(),
            expected: expected.into(),
            found: match found {
                Value::Null => "null".to_string(),
                other => format!("{} {}", other.kind_name(), other),
            },
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Crate-level error covering the full compile → execute → decode round trip.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("statement execution failed on {backend}: {message}")]
    Execution {
        backend: &'static str,
        message: String,
    },
}
