//! Startup program inspector
//!
//! Loads a written startup program and renders its summary or disassembly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod inspect;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use inspect::Inspector;
