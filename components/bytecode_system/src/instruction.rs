//! Emitted instruction representation
//!
//! Contains the instruction structure and its debug origin.

use crate::opcode::Opcode;
use serde::{Deserialize, Serialize};

/// A single step with an optional debug origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// Index of the recorded instruction this step was emitted for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<usize>,
}

impl Instruction {
    /// Create a new instruction without an origin
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            origin: None,
        }
    }

    /// Create a new instruction emitted for recorded instruction `origin`
    pub fn with_origin(opcode: Opcode, origin: usize) -> Self {
        Self {
            opcode,
            origin: Some(origin),
        }
    }
}
