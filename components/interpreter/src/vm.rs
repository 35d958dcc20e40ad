//! The replay VM.
//!
//! Main entry point for executing startup programs.

use bytecode_system::StartupProgram;
use serde::Serialize;
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::info;

use crate::context::StartupContext;
use crate::dispatch::{Dispatcher, Flow};
use crate::error::ReplayResult;
use crate::registry::RuntimeRegistry;

/// Counters collected while replaying
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Units executed
    pub units: usize,
    /// Steps executed
    pub steps: usize,
    /// Recorder invocations
    pub invocations: usize,
    /// Recorder instances constructed
    pub recorders: usize,
}

impl AddAssign for ReplayStats {
    fn add_assign(&mut self, other: Self) {
        self.units += other.units;
        self.steps += other.steps;
        self.invocations += other.invocations;
        self.recorders += other.recorders;
    }
}

/// Replays startup programs
///
/// # Example
///
/// ```
/// use bytecode_system::{CodeUnit, Opcode, StartupProgram};
/// use interpreter::{Replayer, RuntimeRegistry, StartupContext};
///
/// let mut unit = CodeUnit::new("boot_0");
/// unit.emit(Opcode::Return);
/// let mut program = StartupProgram::new("boot", false);
/// program.units.push(unit);
///
/// let replayer = Replayer::new(RuntimeRegistry::default());
/// let stats = replayer.run(&program, &StartupContext::new()).unwrap();
/// assert_eq!(stats.units, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Replayer {
    registry: Arc<RuntimeRegistry>,
}

impl Replayer {
    /// Create a replayer over `registry`
    pub fn new(registry: RuntimeRegistry) -> Self {
        Self::shared(Arc::new(registry))
    }

    /// Create a replayer over a shared registry
    pub fn shared(registry: Arc<RuntimeRegistry>) -> Self {
        Self { registry }
    }

    /// The runtime registry
    pub fn registry(&self) -> &RuntimeRegistry {
        &self.registry
    }

    /// Run one program to completion.
    ///
    /// Units run in chain order, each with a fresh register file; the slot
    /// table lives for the whole program.
    pub fn run(&self, program: &StartupProgram, context: &StartupContext) -> ReplayResult<ReplayStats> {
        program.validate()?;
        let mut dispatcher = Dispatcher::new(program, &self.registry, context);
        let mut index = 0;
        loop {
            match dispatcher.execute_unit(index)? {
                Flow::Next(next) => index = next,
                Flow::Return => break,
            }
        }
        let stats = *dispatcher.stats();
        info!(
            program = %program.name,
            units = stats.units,
            steps = stats.steps,
            invocations = stats.invocations,
            "startup program replayed"
        );
        Ok(stats)
    }

    /// Run several programs in order over one context
    pub fn run_all(&self, programs: &[StartupProgram], context: &StartupContext) -> ReplayResult<ReplayStats> {
        let mut total = ReplayStats::default();
        for program in programs {
            total += self.run(program, context)?;
        }
        Ok(total)
    }
}
