//! Recorded instructions, in recorded order.

use crate::contract::{MethodSignature, RecorderContract};
use core_types::{Placeholder, TypeName, Value};
use std::sync::Arc;

/// One recorded action
#[derive(Debug, Clone)]
pub enum RecordedInstruction {
    /// A call on a recorder
    Invocation {
        /// Recorder the call targets
        contract: Arc<RecorderContract>,
        /// Method called
        method: MethodSignature,
        /// Arguments, resolved when the program is emitted
        args: Vec<Value>,
        /// Placeholder the result is published under, for non-void calls
        result: Option<Placeholder>,
    },
    /// A no-arg construction whose instance is published under a key
    Construction {
        /// Type to construct
        ty: TypeName,
        /// Placeholder the instance is published under
        result: Placeholder,
    },
}

impl RecordedInstruction {
    /// Placeholder the instruction publishes, if any
    pub fn result(&self) -> Option<&Placeholder> {
        match self {
            RecordedInstruction::Invocation { result, .. } => result.as_ref(),
            RecordedInstruction::Construction { result, .. } => Some(result),
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            RecordedInstruction::Invocation {
                contract, method, ..
            } => format!("{}.{}", contract.name(), method.name),
            RecordedInstruction::Construction { ty, .. } => format!("new {}", ty),
        }
    }
}
