//! Error types for filter evaluation and query generation.

use thiserror::Error;

/// Errors returned by the evaluators, the SQL compiler and the JSON entry points.
///
/// Malformed filter text is never an error: the parser degrades to a partial tree.
#[derive(Debug, Error)]
pub enum Error {
    /// The record input is missing or empty.
    #[error("data can't be {0}")]
    InvalidData(String),

    /// A required part of a condition is missing.
    #[error("invalid parameter, {0} is required")]
    InvalidParameter(String),

    /// The record input has an unsupported shape.
    #[error("invalid type, {0} is required")]
    InvalidType(String),

    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("invalid logical operator: {0}")]
    InvalidLogicalOperator(String),

    #[error("invalid sort direction: {0}")]
    InvalidSortDirection(String),

    /// A literal could not be converted to the kind of the field it is compared with.
    #[error("cannot convert {value:?} to {kind}")]
    Coercion { value: String, kind: &'static str },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn coercion(value: impl Into<String>, kind: &'static str) -> Self {
        Error::Coercion {
            value: value.into(),
            kind,
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
