//! Destinations for finished programs.

use crate::error::{ProgramError, ProgramResult};
use crate::program::StartupProgram;
use std::fs;
use std::path::{Path, PathBuf};

/// Sink receiving finished startup programs
pub trait ProgramOutput {
    /// Publish one program
    fn write_program(&mut self, program: &StartupProgram) -> ProgramResult<()>;
}

/// Collects programs in memory
#[derive(Debug, Default)]
pub struct InMemoryOutput {
    programs: Vec<StartupProgram>,
}

impl InMemoryOutput {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs written so far, in order
    pub fn programs(&self) -> &[StartupProgram] {
        &self.programs
    }

    /// Take the collected programs
    pub fn into_programs(self) -> Vec<StartupProgram> {
        self.programs
    }
}

impl ProgramOutput for InMemoryOutput {
    fn write_program(&mut self, program: &StartupProgram) -> ProgramResult<()> {
        self.programs.push(program.clone());
        Ok(())
    }
}

/// Writes each program to `<dir>/<program name>.json`
#[derive(Debug, Clone)]
pub struct DirectoryOutput {
    dir: PathBuf,
}

impl DirectoryOutput {
    /// Write into `dir`, creating it on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a program with this name is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Read back a program previously written here
    pub fn read_program(&self, name: &str) -> ProgramResult<StartupProgram> {
        let path = self.path_for(name);
        let json = fs::read_to_string(&path).map_err(|source| ProgramError::Io { path, source })?;
        StartupProgram::from_json(&json)
    }
}

impl ProgramOutput for DirectoryOutput {
    fn write_program(&mut self, program: &StartupProgram) -> ProgramResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| ProgramError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(&program.name);
        let json = program.to_json()?;
        fs::write(&path, json).map_err(|source| ProgramError::Io { path, source })
    }
}
