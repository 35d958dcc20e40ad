//! Object substitutions.
//!
//! A substitution lets a type that cannot be decomposed be represented by a
//! decomposable stand-in: the recorder serializes the original into the
//! stand-in, and replay deserializes the stand-in back.

use crate::error::ValueResult;
use crate::value::Value;

/// Conversion between a type and its serialized stand-in
pub trait ObjectSubstitution: Send + Sync {
    /// Convert the original value into its stand-in
    fn serialize(&self, value: &Value) -> ValueResult<Value>;

    /// Rebuild the original value from its stand-in
    fn deserialize(&self, serialized: Value) -> ValueResult<Value>;
}

/// Substitution built from a pair of closures
pub struct FnSubstitution<S, D> {
    serialize: S,
    deserialize: D,
}

impl<S, D> FnSubstitution<S, D>
where
    S: Fn(&Value) -> ValueResult<Value> + Send + Sync,
    D: Fn(Value) -> ValueResult<Value> + Send + Sync,
{
    /// Create a substitution from serialize and deserialize closures
    pub fn new(serialize: S, deserialize: D) -> Self {
        Self {
            serialize,
            deserialize,
        }
    }
}

impl<S, D> ObjectSubstitution for FnSubstitution<S, D>
where
    S: Fn(&Value) -> ValueResult<Value> + Send + Sync,
    D: Fn(Value) -> ValueResult<Value> + Send + Sync,
{
    fn serialize(&self, value: &Value) -> ValueResult<Value> {
        (self.serialize)(value)
    }

    fn deserialize(&self, serialized: Value) -> ValueResult<Value> {
        (self.deserialize)(serialized)
    }
}
