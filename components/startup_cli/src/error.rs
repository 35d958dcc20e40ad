//! Error types for the CLI

use bytecode_system::ProgramError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The program file could not be read
    #[error("could not read '{}': {source}", path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The program could not be decoded or is malformed
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// The summary could not be rendered as JSON
    #[error("could not render summary: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
