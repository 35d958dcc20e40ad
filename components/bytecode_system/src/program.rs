//! Startup programs: chained code units sharing one slot table.

use crate::error::{ProgramError, ProgramResult};
use crate::opcode::Opcode;
use crate::unit::CodeUnit;
use core_types::LiteralType;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// A replayable startup program.
///
/// Units run in order: each unit but the last ends by chaining to the next
/// one, and the last unit returns to the caller. All units share one slot
/// table of `slot_count` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupProgram {
    /// Program name
    pub name: String,
    /// Whether the program runs during static initialization
    pub static_init: bool,
    /// Size of the shared slot table
    pub slot_count: u32,
    /// Chained code units; the first is the entry point
    pub units: Vec<CodeUnit>,
    /// Metadata literal types constructed by the program
    #[serde(default)]
    pub literal_types: Vec<LiteralType>,
}

/// Summary counts of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSummary {
    /// Program name
    pub name: String,
    /// `static-init` or `runtime-init`
    pub phase: &'static str,
    /// Size of the slot table
    pub slot_count: u32,
    /// Number of units
    pub unit_count: usize,
    /// Total number of steps
    pub step_count: usize,
    /// Total number of recorder invocations
    pub invocation_count: usize,
    /// Number of literal types carried by the program
    pub literal_type_count: usize,
}

impl StartupProgram {
    /// Create a program with no units
    pub fn new(name: impl Into<String>, static_init: bool) -> Self {
        Self {
            name: name.into(),
            static_init,
            slot_count: 0,
            units: Vec::new(),
            literal_types: Vec::new(),
        }
    }

    /// Phase label
    pub fn phase(&self) -> &'static str {
        if self.static_init {
            "static-init"
        } else {
            "runtime-init"
        }
    }

    /// Entry unit
    pub fn entry(&self) -> Option<&CodeUnit> {
        self.units.first()
    }

    /// Find a carried literal type by name
    pub fn literal_type(&self, name: &str) -> Option<&LiteralType> {
        self.literal_types.iter().find(|t| t.name.is(name))
    }

    /// Total number of steps across all units
    pub fn step_count(&self) -> usize {
        self.units.iter().map(|u| u.instruction_count()).sum()
    }

    /// Total number of recorder invocations
    pub fn invocation_count(&self) -> usize {
        self.units.iter().map(|u| u.invocation_count()).sum()
    }

    /// Summary counts
    pub fn summary(&self) -> ProgramSummary {
        ProgramSummary {
            name: self.name.clone(),
            phase: self.phase(),
            slot_count: self.slot_count,
            unit_count: self.units.len(),
            step_count: self.step_count(),
            invocation_count: self.invocation_count(),
            literal_type_count: self.literal_types.len(),
        }
    }

    /// Check the structural rules every program must satisfy: units chain
    /// strictly in order, the last unit returns, and every register, slot
    /// and constant reference is in range.
    pub fn validate(&self) -> ProgramResult<()> {
        if self.units.is_empty() {
            return Err(self.malformed(0, "program has no units".to_string()));
        }
        let last = self.units.len() - 1;
        for (index, unit) in self.units.iter().enumerate() {
            let expected = if index == last {
                Opcode::Return
            } else {
                Opcode::ChainNext(index + 1)
            };
            match unit.terminator() {
                Some(op) if *op == expected => {}
                Some(op) => {
                    return Err(self.malformed(index, format!("ends with {}, expected {}", op, expected)))
                }
                None => return Err(self.malformed(index, "unit is not terminated".to_string())),
            }
            let body = &unit.instructions[..unit.instructions.len() - 1];
            for inst in body {
                let op = &inst.opcode;
                if op.is_terminator() {
                    return Err(self.malformed(index, format!("{} before end of unit", op)));
                }
                let registers = op.destination().into_iter().chain(op.sources());
                for reg in registers {
                    if reg.0 >= unit.register_count {
                        return Err(self.malformed(index, format!("{} out of range in {}", reg, op)));
                    }
                }
                if let Some(slot) = op.slot() {
                    if slot.0 >= self.slot_count {
                        return Err(self.malformed(index, format!("{} out of range in {}", slot, op)));
                    }
                }
                if let Opcode::LoadConstant { index: constant, .. } = op {
                    if *constant >= unit.constants.len() {
                        return Err(self.malformed(index, format!("constant #{} out of range", constant)));
                    }
                }
                if let Opcode::NewLiteral { literal, .. } = op {
                    if self.literal_type(literal.as_str()).is_none() {
                        return Err(self.malformed(index, format!("literal type {} not carried", literal)));
                    }
                }
            }
        }
        Ok(())
    }

    fn malformed(&self, unit: usize, reason: String) -> ProgramError {
        ProgramError::Malformed {
            program: self.name.clone(),
            unit,
            reason,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> ProgramResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a program from JSON
    pub fn from_json(json: &str) -> ProgramResult<Self> {
        let program: StartupProgram = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    /// Human-readable listing of every unit
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "program {} ({}, {} slots, {} units)",
            self.name,
            self.phase(),
            self.slot_count,
            self.units.len()
        );
        for literal in &self.literal_types {
            let elements = literal
                .elements
                .iter()
                .map(|e| format!("{}: {}", e.name, e.ty))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "literal {} implements {} ({})", literal.name, literal.contract, elements);
        }
        for (index, unit) in self.units.iter().enumerate() {
            let _ = writeln!(
                out,
                "unit{} {} ({} registers, {} constants)",
                index,
                unit.name,
                unit.register_count,
                unit.constants.len()
            );
            for (i, constant) in unit.constants.iter().enumerate() {
                let _ = writeln!(out, "  #{} = {}", i, constant);
            }
            for (offset, inst) in unit.instructions.iter().enumerate() {
                match inst.origin {
                    Some(origin) => {
                        let _ = writeln!(out, "  {:04}  {:<48} ; @{}", offset, inst.opcode.to_string(), origin);
                    }
                    None => {
                        let _ = writeln!(out, "  {:04}  {}", offset, inst.opcode);
                    }
                }
            }
        }
        out
    }
}
