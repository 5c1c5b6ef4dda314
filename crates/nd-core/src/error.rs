//! Error types for the regression crates

use thiserror::Error;

/// Regression error type
#[derive(Error, Debug)]
pub enum Error {
    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input values (empty data, non-finite entries, negative counts)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested column is not present in the input table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Data and parameter dimensions disagree
    #[error("Shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Operation that detected the mismatch
        context: String,
        /// Expected shape, formatted
        expected: String,
        /// Observed shape, formatted
        got: String,
    },

    /// Contract violation on the model configuration
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),
}

impl Error {
    /// Build a [`Error::ShapeMismatch`] from displayable parts.
    pub fn shape(
        context: impl Into<String>,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        Error::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
