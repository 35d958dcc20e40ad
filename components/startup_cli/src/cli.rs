//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

/// Inspect a recorded startup program
#[derive(Debug, Parser)]
#[command(name = "startup-inspect", version, about)]
pub struct Cli {
    /// Program JSON file to inspect
    #[arg(short, long)]
    pub file: PathBuf,

    /// Print every unit and step
    #[arg(short, long)]
    pub disassemble: bool,

    /// Print the summary as JSON
    #[arg(short, long)]
    pub json_summary: bool,
}
