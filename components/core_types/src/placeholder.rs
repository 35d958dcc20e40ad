//! Placeholders for results of recorded calls.

use crate::error::{ValueError, ValueResult};
use crate::types::TypeRef;
use crate::value::Value;
use std::fmt;

/// Stand-in returned by a recording proxy for a non-void call.
///
/// A placeholder carries an opaque key under which the replayed call will
/// publish its real result, and the phase of the program that recorded it.
/// It can only be handed back into a recorder; the caller cannot observe
/// the value it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    key: String,
    static_init: bool,
    ty: TypeRef,
}

impl Placeholder {
    /// Create a placeholder for a result of type `ty`
    pub fn new(key: impl Into<String>, static_init: bool, ty: TypeRef) -> Self {
        Self {
            key: key.into(),
            static_init,
            ty,
        }
    }

    /// Opaque key the replayed result is published under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the placeholder was produced by a static-phase program
    pub fn is_static_init(&self) -> bool {
        self.static_init
    }

    /// Declared type of the value this placeholder stands for
    pub fn result_type(&self) -> &TypeRef {
        &self.ty
    }

    /// Diagnostic label
    pub fn label(&self) -> String {
        format!("Runtime proxy of {} with id {}", self.ty, self.key)
    }

    /// Invoke a method on the placeholder.
    ///
    /// Only the key and phase accessors and `toString` are answered; any
    /// other method fails with [`ValueError::RecordedProxyMisuse`].
    pub fn invoke(&self, method: &str) -> ValueResult<Value> {
        match method {
            "toString" => Ok(Value::from(self.label())),
            "getKey" => Ok(Value::from(self.key.as_str())),
            "isStaticInit" => Ok(Value::Bool(self.static_init)),
            _ => Err(ValueError::RecordedProxyMisuse {
                method: method.to_string(),
                label: self.label(),
            }),
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
