//! Constant pool entries.

use core_types::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A literal stored in a unit's constant pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    /// Boolean
    Bool(bool),
    /// Signed 8-bit integer
    Byte(i8),
    /// Signed 16-bit integer
    Short(i16),
    /// Signed 32-bit integer
    Int(i32),
    /// Signed 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Unicode scalar
    Char(char),
    /// String
    String(String),
}

impl Constant {
    /// Convert a scalar or string value into a constant
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Bool(b) => Constant::Bool(*b),
            Value::Byte(n) => Constant::Byte(*n),
            Value::Short(n) => Constant::Short(*n),
            Value::Int(n) => Constant::Int(*n),
            Value::Long(n) => Constant::Long(*n),
            Value::Float(n) => Constant::Float(*n),
            Value::Double(n) => Constant::Double(*n),
            Value::Char(c) => Constant::Char(*c),
            Value::String(s) => Constant::String(s.to_string()),
            _ => return None,
        })
    }

    /// The value this constant loads as
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Byte(n) => Value::Byte(*n),
            Constant::Short(n) => Value::Short(*n),
            Constant::Int(n) => Value::Int(*n),
            Constant::Long(n) => Value::Long(*n),
            Constant::Float(n) => Value::Float(*n),
            Constant::Double(n) => Value::Double(*n),
            Constant::Char(c) => Value::Char(*c),
            Constant::String(s) => Value::String(Arc::from(s.as_str())),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Byte(n) => write!(f, "{}b", n),
            Constant::Short(n) => write!(f, "{}s", n),
            Constant::Int(n) => write!(f, "{}", n),
            Constant::Long(n) => write!(f, "{}L", n),
            Constant::Float(n) => write!(f, "{}f", n),
            Constant::Double(n) => write!(f, "{}d", n),
            Constant::Char(c) => write!(f, "'{}'", c.escape_default()),
            Constant::String(s) => write!(f, "\"{}\"", s.escape_default()),
        }
    }
}
