//! Errors raised while replaying a startup program.

use bytecode_system::{ProgramError, RegisterId, SlotId};
use core_types::{TypeName, ValueError};
use thiserror::Error;

/// Error raised by the replay VM
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The program failed validation
    #[error(transparent)]
    Malformed(#[from] ProgramError),

    /// No recorder factory is registered for a contract
    #[error("no recorder registered for {0}")]
    UnknownRecorder(TypeName),

    /// No substitution is registered under an id
    #[error("no substitution registered under '{0}'")]
    UnknownSubstitution(String),

    /// No static function is registered under a name
    #[error("no static function registered under '{0}'")]
    UnknownFunction(String),

    /// The program does not carry a literal type it constructs
    #[error("literal type {0} is not carried by the program")]
    UnknownLiteralType(TypeName),

    /// An enum constant does not exist
    #[error("{ty} has no constant {name}")]
    UnknownEnumConstant {
        /// Declaring type
        ty: TypeName,
        /// Constant name
        name: String,
    },

    /// A context value was fetched before it was published
    #[error("no value published under '{0}' in the startup context")]
    MissingContextValue(String),

    /// A register was read before it was written
    #[error("register {register} read before it was written in {unit}")]
    UnsetRegister {
        /// Unit being executed
        unit: String,
        /// Register read
        register: RegisterId,
    },

    /// A constant index is outside the unit's pool
    #[error("constant #{index} does not exist in {unit}")]
    UnknownConstant {
        /// Unit being executed
        unit: String,
        /// Constant index
        index: usize,
    },

    /// A slot was written twice
    #[error("slot {0} written twice")]
    SlotAlreadyWritten(SlotId),

    /// A slot was read before it was written
    #[error("slot {0} read before it was written")]
    SlotUnset(SlotId),

    /// A slot index is outside the table
    #[error("slot {slot} out of range for a table of {size}")]
    SlotOutOfRange {
        /// Slot accessed
        slot: SlotId,
        /// Table size
        size: usize,
    },

    /// An operand did not have the shape a step needs
    #[error("{step} expected {expected}, found {found}")]
    TypeMismatch {
        /// Step being executed
        step: &'static str,
        /// What the step needed
        expected: &'static str,
        /// What it got
        found: String,
    },

    /// A recorder call that must produce a result produced none
    #[error("{recorder}.{method}() returned no result")]
    MissingResult {
        /// Recorder contract
        recorder: TypeName,
        /// Method called
        method: String,
    },

    /// A recorder rejected a call
    #[error("{recorder}.{method}() failed: {message}")]
    Recorder {
        /// Recorder contract
        recorder: TypeName,
        /// Method called
        method: String,
        /// Failure description
        message: String,
    },

    /// A value-model operation failed
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Result alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;
