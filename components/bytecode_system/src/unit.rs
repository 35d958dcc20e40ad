//! Code unit - one bounded segment of a startup program
//!
//! Contains steps, constants, and the register count for execution.

use crate::constant::Constant;
use crate::instruction::Instruction;
use crate::opcode::{Opcode, RegisterId};
use serde::{Deserialize, Serialize};

/// A bounded sequence of steps with its own constant pool and registers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeUnit {
    /// Unit name
    pub name: String,
    /// Sequence of steps
    pub instructions: Vec<Instruction>,
    /// Constant pool for literal values
    pub constants: Vec<Constant>,
    /// Number of registers needed for execution
    pub register_count: u32,
}

impl CodeUnit {
    /// Create a new empty unit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            constants: Vec::new(),
            register_count: 0,
        }
    }

    /// Emit a step without origin
    pub fn emit(&mut self, opcode: Opcode) {
        self.instructions.push(Instruction::new(opcode));
    }

    /// Emit a step with an optional origin
    pub fn emit_from(&mut self, opcode: Opcode, origin: Option<usize>) {
        self.instructions.push(Instruction { opcode, origin });
    }

    /// Add a constant to the constant pool and return its index.
    /// Equal constants share one entry.
    pub fn add_constant(&mut self, constant: Constant) -> usize {
        if let Some(idx) = self.constants.iter().position(|c| c == &constant) {
            return idx;
        }
        let idx = self.constants.len();
        self.constants.push(constant);
        idx
    }

    /// Allocate a fresh register
    pub fn alloc_register(&mut self) -> RegisterId {
        let reg = RegisterId(self.register_count);
        self.register_count += 1;
        reg
    }

    /// Get the number of steps
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Get the number of constants
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// The final step, if any
    pub fn terminator(&self) -> Option<&Opcode> {
        self.instructions
            .last()
            .map(|i| &i.opcode)
            .filter(|op| op.is_terminator())
    }

    /// Number of recorder invocations in this unit
    pub fn invocation_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i.opcode, Opcode::Invoke { .. }))
            .count()
    }
}
