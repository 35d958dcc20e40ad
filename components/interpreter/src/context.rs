//! Execution state: the ambient startup context and per-unit frames.

use bytecode_system::{CodeUnit, Instruction, RegisterId};
use core_types::Value;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{ReplayError, ReplayResult};

/// The ambient context threaded through every unit.
///
/// Recorded results are published here under their placeholder keys.
/// Environment handles can be seeded before replay.
#[derive(Debug, Default)]
pub struct StartupContext {
    values: RwLock<HashMap<String, Value>>,
}

impl StartupContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, builder style
    pub fn with(self, key: impl Into<String>, value: Value) -> Self {
        self.put(key, value);
        self
    }

    /// Publish a value, replacing any previous one
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    /// Value published under `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Whether anything is published under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Number of published values
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Whether nothing is published
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Published keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Execution state of one code unit
#[derive(Debug)]
pub struct UnitFrame<'u> {
    unit: &'u CodeUnit,
    registers: Vec<Option<Value>>,
    instruction_pointer: usize,
}

impl<'u> UnitFrame<'u> {
    /// Fresh frame with every register unset
    pub fn new(unit: &'u CodeUnit) -> Self {
        Self {
            unit,
            registers: vec![None; unit.register_count as usize],
            instruction_pointer: 0,
        }
    }

    /// Unit being executed
    pub fn unit(&self) -> &'u CodeUnit {
        self.unit
    }

    /// Advance and return the next instruction
    pub fn fetch(&mut self) -> Option<&'u Instruction> {
        let instruction = self.unit.instructions.get(self.instruction_pointer)?;
        self.instruction_pointer += 1;
        Some(instruction)
    }

    /// Read a register
    pub fn get(&self, register: RegisterId) -> ReplayResult<Value> {
        self.registers
            .get(register.0 as usize)
            .and_then(|v| v.clone())
            .ok_or_else(|| ReplayError::UnsetRegister {
                unit: self.unit.name.clone(),
                register,
            })
    }

    /// Read several registers
    pub fn get_all(&self, registers: &[RegisterId]) -> ReplayResult<Vec<Value>> {
        registers.iter().map(|r| self.get(*r)).collect()
    }

    /// Write a register, growing the file if needed
    pub fn set(&mut self, register: RegisterId, value: Value) {
        let index = register.0 as usize;
        if index >= self.registers.len() {
            self.registers.resize(index + 1, None);
        }
        self.registers[index] = Some(value);
    }
}
