//! Errors raised while reading, validating or writing programs.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised by program serialization, validation and output
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The program JSON could not be parsed or produced
    #[error("invalid program JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing or reading a program file failed
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program violates a structural rule
    #[error("malformed program {program}, unit {unit}: {reason}")]
    Malformed {
        /// Program name
        program: String,
        /// Offending unit index
        unit: usize,
        /// What is wrong
        reason: String,
    },
}

/// Result alias for program operations
pub type ProgramResult<T> = Result<T, ProgramError>;
