//! Program loading and rendering

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use bytecode_system::StartupProgram;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

/// A loaded, validated startup program
#[derive(Debug, Clone)]
pub struct Inspector {
    program: StartupProgram,
}

impl Inspector {
    /// Load and validate the program at `path`
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read, is not a program, or
    /// fails validation
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = json.len(), "loaded program file");
        Self::from_program(StartupProgram::from_json(&json)?)
    }

    /// Wrap an in-memory program
    pub fn from_program(program: StartupProgram) -> CliResult<Self> {
        program.validate()?;
        Ok(Self { program })
    }

    /// The program
    pub fn program(&self) -> &StartupProgram {
        &self.program
    }

    /// Human-readable summary
    pub fn summary_text(&self) -> String {
        let summary = self.program.summary();
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "program:      {}", summary.name);
        let _ = writeln!(out, "phase:        {}", summary.phase);
        let _ = writeln!(out, "slots:        {}", summary.slot_count);
        let _ = writeln!(out, "units:        {}", summary.unit_count);
        let _ = writeln!(out, "steps:        {}", summary.step_count);
        let _ = writeln!(out, "invocations:  {}", summary.invocation_count);
        let _ = writeln!(out, "literals:     {}", summary.literal_type_count);
        out
    }

    /// Summary as pretty-printed JSON
    pub fn summary_json(&self) -> CliResult<String> {
        Ok(serde_json::to_string_pretty(&self.program.summary())?)
    }

    /// Full disassembly
    pub fn disassembly(&self) -> String {
        self.program.disassemble()
    }

    /// Render the output `cli` asks for
    pub fn render(&self, cli: &Cli) -> CliResult<String> {
        let mut out = if cli.json_summary {
            self.summary_json()?
        } else {
            self.summary_text()
        };
        if cli.disassemble {
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
            out.push_str(&self.disassembly());
        }
        Ok(out)
    }
}
