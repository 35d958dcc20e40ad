//! The slot table shared by all units of one program.

use bytecode_system::SlotId;
use core_types::Value;

use crate::error::{ReplayError, ReplayResult};

/// Write-once slots holding values that cross unit boundaries
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Option<Value>>,
}

impl SlotTable {
    /// Table of `size` unwritten slots
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of written slots
    pub fn written(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Write a slot; each slot may be written once
    pub fn write(&mut self, slot: SlotId, value: Value) -> ReplayResult<()> {
        let size = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot.0 as usize)
            .ok_or(ReplayError::SlotOutOfRange { slot, size })?;
        if entry.is_some() {
            return Err(ReplayError::SlotAlreadyWritten(slot));
        }
        *entry = Some(value);
        Ok(())
    }

    /// Read a written slot
    pub fn read(&self, slot: SlotId) -> ReplayResult<Value> {
        match self.slots.get(slot.0 as usize) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(ReplayError::SlotUnset(slot)),
            None => Err(ReplayError::SlotOutOfRange {
                slot,
                size: self.slots.len(),
            }),
        }
    }
}
