//! Program model for startup replay
//!
//! This crate defines the step vocabulary, code units and chained startup
//! programs produced by the recorder and executed by the replay VM.
//!
//! # Features
//!
//! - Register-based steps, one register file per unit
//! - Units chained in order, sharing one slot table
//! - JSON serialization with structural validation
//! - Textual disassembly and summary counts
//! - In-memory and directory program outputs
//!
//! # Example
//!
//! ```
//! use bytecode_system::{CodeUnit, Constant, Opcode, StartupProgram};
//!
//! let mut unit = CodeUnit::new("steps.Demo$run1_0");
//!
//! // Add constants
//! let idx = unit.add_constant(Constant::String("ready".to_string()));
//!
//! // Emit steps
//! let reg = unit.alloc_register();
//! unit.emit(Opcode::LoadConstant { dst: reg, index: idx });
//! unit.emit(Opcode::PutContextValue { key: "state".to_string(), src: reg });
//! unit.emit(Opcode::Return);
//!
//! let mut program = StartupProgram::new("steps.Demo$run1", false);
//! program.units.push(unit);
//! program.validate().unwrap();
//!
//! // Serialize
//! let json = program.to_json().unwrap();
//! let restored = StartupProgram::from_json(&json).unwrap();
//! assert_eq!(restored, program);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constant;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod output;
pub mod program;
pub mod unit;

// Re-export main types at crate root
pub use constant::Constant;
pub use error::{ProgramError, ProgramResult};
pub use instruction::Instruction;
pub use opcode::{CollectionShape, Opcode, RegisterId, SlotId};
pub use output::{DirectoryOutput, InMemoryOutput, ProgramOutput};
pub use program::{ProgramSummary, StartupProgram};
pub use unit::CodeUnit;
