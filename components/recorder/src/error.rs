//! Errors raised while recording and emitting startup programs.
//!
//! Every error here is fatal to the session that raised it: nothing is
//! retried and no partially emitted program is published.

use bytecode_system::ProgramError;
use core_types::{TypeName, TypeRef, ValueError};
use thiserror::Error;

/// Error raised by the recording pipeline
#[derive(Debug, Error)]
pub enum RecordingError {
    /// A non-void recorder method returns a type that cannot be proxied
    #[error("unsupported result type {ty} for {contract}.{method}(): result types must be interfaces or non-final classes with a no-arg constructor")]
    UnsupportedResultType {
        /// Recorder contract
        contract: TypeName,
        /// Method name
        method: String,
        /// Declared result type
        ty: TypeRef,
    },

    /// The contract declares no method with this name and arity
    #[error("{contract} declares no method {method} taking {arity} argument(s)")]
    UnknownMethod {
        /// Recorder contract
        contract: TypeName,
        /// Method name
        method: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// A non-default constructor mapping produced the wrong number of arguments
    #[error("argument count mismatch: unable to serialize {ty}, the constructor takes {expected} parameter(s) but {actual} were generated")]
    ArgumentCountMismatch {
        /// Type being constructed
        ty: TypeName,
        /// Constructor arity
        expected: usize,
        /// Generated argument count
        actual: usize,
    },

    /// No construction strategy exists for a value
    #[error("no default constructor available for {0}")]
    NoDefaultConstructor(TypeName),

    /// A runtime-phase result was used by a static-phase program
    #[error("{label} was created during runtime init and cannot be used during static init")]
    PhaseMismatch {
        /// Diagnostic label of the placeholder
        label: String,
    },

    /// A value was resolved after the graph was sealed
    #[error("already finalized: no values may be resolved after the value graph is sealed")]
    AlreadyFinalized,

    /// The emitter found the graph in a state that correct operation never produces
    #[error("internal consistency violation: {0}")]
    InternalConsistency(String),

    /// A metadata instance was paired with a different contract
    #[error("metadata contract mismatch: instance of {instance} paired with contract {contract}")]
    MetadataContractMismatch {
        /// Contract named by the instance
        instance: TypeName,
        /// Contract supplied
        contract: TypeName,
    },

    /// A metadata instance names an element its contract does not declare
    #[error("{contract} declares no element named '{element}'")]
    UnknownElement {
        /// Contract
        contract: TypeName,
        /// Element name
        element: String,
    },

    /// No explicit, declared or caller-supplied value exists for an element
    #[error("value not set for element '{element}' of {contract}")]
    MetadataValueMissing {
        /// Contract
        contract: TypeName,
        /// Element name
        element: String,
    },

    /// A substitution failed to serialize a value
    #[error("failed to substitute {ty}: {source}")]
    Substitution {
        /// Type being substituted
        ty: TypeName,
        /// Underlying failure
        #[source]
        source: ValueError,
    },

    /// The recorder configuration is invalid
    #[error("invalid recorder configuration: {0}")]
    InvalidConfig(String),

    /// A value kind that cannot be recorded
    #[error("unsupported value: {0} cannot be recorded")]
    UnsupportedValue(String),

    /// A value-model operation failed
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Writing the program failed
    #[error(transparent)]
    Program(#[from] ProgramError),
}

/// Result alias for recording operations
pub type RecordingResult<T> = Result<T, RecordingError>;
