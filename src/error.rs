//! Error types for the termlight library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`TermlightError`] enum.
//!
//! # Examples
//!
//! ```
//! use termlight::error::{Result, TermlightError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TermlightError::invalid_query("phrase without terms"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for termlight operations.
#[derive(Error, Debug)]
pub enum TermlightError {
    /// The field's term vector did not store offsets, or an occurrence lacks one.
    ///
    /// Token order cannot be rebuilt from positions alone, so the caller has to
    /// request term vectors with offsets or skip highlighting this field.
    #[error("Missing offsets: term vector for field '{field}' has no offsets")]
    MissingOffsets { field: String },

    /// Fragment count or fragment size is zero.
    #[error("Invalid fragment request: {0}")]
    InvalidFragmentRequest(String),

    /// Malformed query shape (clause without terms, negative boost, ...).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Inconsistent occurrence data inside a term vector.
    #[error("Invalid term vector: {0}")]
    InvalidTermVector(String),

    /// A token's offsets do not fit the text being highlighted.
    #[error("Invalid token offsets: [{start}, {end}) does not fit text of length {text_len}")]
    InvalidTokenOffsets {
        start: usize,
        end: usize,
        text_len: usize,
    },

    /// The term vector source has no entry for the requested field.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// I/O errors (reading term vectors, queries or text from disk)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TermlightError.
pub type Result<T> = std::result::Result<T, TermlightError>;

impl TermlightError {
    /// Create a new missing offsets error for a field.
    pub fn missing_offsets<S: Into<String>>(field: S) -> Self {
        TermlightError::MissingOffsets {
            field: field.into(),
        }
    }

    /// Create a new invalid fragment request error.
    pub fn invalid_fragment_request<S: Into<String>>(msg: S) -> Self {
        TermlightError::InvalidFragmentRequest(msg.into())
    }

    /// Create a new invalid query error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        TermlightError::InvalidQuery(msg.into())
    }

    /// Create a new invalid term vector error.
    pub fn invalid_term_vector<S: Into<String>>(msg: S) -> Self {
        TermlightError::InvalidTermVector(msg.into())
    }

    /// Create a new invalid token offsets error.
    pub fn invalid_token_offsets(start: usize, end: usize, text_len: usize) -> Self {
        TermlightError::InvalidTokenOffsets {
            start,
            end,
            text_len,
        }
    }

    /// Create a new field not found error.
    pub fn field_not_found<S: Into<String>>(field: S) -> Self {
        TermlightError::FieldNotFound(field.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TermlightError::Other(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        TermlightError::Other(format!("Invalid configuration: {}", msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TermlightError::missing_offsets("body");
        assert_eq!(
            error.to_string(),
            "Missing offsets: term vector for field 'body' has no offsets"
        );

        let error = TermlightError::invalid_query("empty phrase");
        assert_eq!(error.to_string(), "Invalid query: empty phrase");

        let error = TermlightError::invalid_token_offsets(4, 12, 10);
        assert_eq!(
            error.to_string(),
            "Invalid token offsets: [4, 12) does not fit text of length 10"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = TermlightError::from(io_error);

        match error {
            TermlightError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
