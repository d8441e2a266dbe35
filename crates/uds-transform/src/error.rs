//! Error types for the crosswalk engine.

use thiserror::Error;

/// Errors raised while converting tables or parsing rule expressions.
///
/// None of these abort a migration run: the engine records expression
/// failures as gaps and moves on. Only DataFrame failures reach the caller.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Arithmetic formula could not be parsed.
    #[error("malformed expression '{expression}': {message}")]
    Expression { expression: String, message: String },

    /// Columns of different lengths supplied to a frame.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    Shape {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for TransformError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, TransformError>;
