//! Dynamic value representation.
//!
//! A [`Value`] is anything that can be passed to a recorder method at record
//! time or rebuilt by a startup program at replay time. Scalars, strings,
//! enum constants and class references are plain data; objects and arrays
//! are shared references with identity (see [`crate::object`]).
//!
//! # Examples
//!
//! ```
//! use core_types::{IdentityKey, Value};
//!
//! let a = Value::from("hello");
//! let b = Value::from("hello");
//! assert_eq!(a, b);
//! assert_eq!(a.identity(), b.identity());
//! assert_ne!(Value::Int(1).identity(), Value::Long(1).identity());
//! assert_eq!(Value::Null.identity(), IdentityKey::Null);
//! ```

use crate::metadata::{MetadataLiteral, MetadataProxy};
use crate::object::{ArrayRef, ObjectRef};
use crate::placeholder::Placeholder;
use crate::types::{well_known, PrimitiveType, TypeName, TypeRef};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An enum constant, identified by declaring type and constant name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    /// Declaring enum type
    pub ty: TypeName,
    /// Constant name
    pub name: String,
}

impl EnumConstant {
    /// Create an enum constant reference
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: TypeName::new(ty),
            name: name.into(),
        }
    }
}

/// Opaque host object. Only ever produced at replay time (for example the
/// result of a recorder method); it cannot be recorded.
#[derive(Clone)]
pub struct NativeRef(Arc<dyn Any + Send + Sync>);

impl NativeRef {
    /// Wrap a host object
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Wrap an already shared host object
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    /// Borrow the host object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether both handles refer to the same host object
    pub fn ptr_eq(&self, other: &NativeRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native@{:x}", self.identity())
    }
}

/// Any recordable or replayable value.
#[derive(Clone)]
pub enum Value {
    /// Absence of a value
    Null,
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
    /// Immutable string
    String(Arc<str>),
    /// Enum constant
    Enum(EnumConstant),
    /// Reference to a class, resolved by name at replay time
    Class(TypeName),
    /// Optional value, present or absent
    Optional(Option<Box<Value>>),
    /// Fixed-length array
    Array(ArrayRef),
    /// Object with a class descriptor
    Object(ObjectRef),
    /// Result of a recorded call, standing in for the value replay will produce
    Placeholder(Placeholder),
    /// Record-time request to build a metadata literal
    MetadataProxy(Arc<MetadataProxy>),
    /// Replay-time metadata literal instance
    Metadata(Arc<MetadataLiteral>),
    /// Opaque host object
    Native(NativeRef),
}

/// Memoization key of a value.
///
/// Reference values key by address, everything else by content. Integer
/// keys are typed, so `Int(1)` and `Long(1)` do not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Byte
    Byte(i8),
    /// Short
    Short(i16),
    /// Int
    Int(i32),
    /// Long
    Long(i64),
    /// Float, by bit pattern
    Float(u32),
    /// Double, by bit pattern
    Double(u64),
    /// Char
    Char(char),
    /// String, by content
    String(Arc<str>),
    /// Enum constant
    Enum(TypeName, String),
    /// Class reference
    Class(TypeName),
    /// Placeholder, by key
    Placeholder(String),
    /// Optional, by payload
    Optional(Option<Box<IdentityKey>>),
    /// Reference value, by address
    Reference(usize),
}

impl Value {
    /// Zero value of a primitive type
    pub fn zero_of(primitive: PrimitiveType) -> Value {
        match primitive {
            PrimitiveType::Bool => Value::Bool(false),
            PrimitiveType::Byte => Value::Byte(0),
            PrimitiveType::Short => Value::Short(0),
            PrimitiveType::Int => Value::Int(0),
            PrimitiveType::Long => Value::Long(0),
            PrimitiveType::Float => Value::Float(0.0),
            PrimitiveType::Double => Value::Double(0.0),
            PrimitiveType::Char => Value::Char('\0'),
        }
    }

    /// Present optional
    pub fn some(value: Value) -> Value {
        Value::Optional(Some(Box::new(value)))
    }

    /// Absent optional
    pub fn none() -> Value {
        Value::Optional(None)
    }

    /// Enum constant value
    pub fn enum_constant(ty: impl Into<String>, name: impl Into<String>) -> Value {
        Value::Enum(EnumConstant::new(ty, name))
    }

    /// Class reference value
    pub fn class(name: impl Into<String>) -> Value {
        Value::Class(TypeName::new(name))
    }

    /// Memoization key of this value
    pub fn identity(&self) -> IdentityKey {
        match self {
            Value::Null => IdentityKey::Null,
            Value::Bool(b) => IdentityKey::Bool(*b),
            Value::Byte(n) => IdentityKey::Byte(*n),
            Value::Short(n) => IdentityKey::Short(*n),
            Value::Int(n) => IdentityKey::Int(*n),
            Value::Long(n) => IdentityKey::Long(*n),
            Value::Float(n) => IdentityKey::Float(n.to_bits()),
            Value::Double(n) => IdentityKey::Double(n.to_bits()),
            Value::Char(c) => IdentityKey::Char(*c),
            Value::String(s) => IdentityKey::String(s.clone()),
            Value::Enum(e) => IdentityKey::Enum(e.ty.clone(), e.name.clone()),
            Value::Class(name) => IdentityKey::Class(name.clone()),
            Value::Optional(inner) => {
                IdentityKey::Optional(inner.as_ref().map(|v| Box::new(v.identity())))
            }
            Value::Array(array) => IdentityKey::Reference(array.identity()),
            Value::Object(object) => IdentityKey::Reference(object.identity()),
            Value::Placeholder(p) => IdentityKey::Placeholder(p.key().to_string()),
            Value::MetadataProxy(proxy) => {
                IdentityKey::Reference(Arc::as_ptr(proxy) as *const () as usize)
            }
            Value::Metadata(literal) => {
                IdentityKey::Reference(Arc::as_ptr(literal) as *const () as usize)
            }
            Value::Native(native) => IdentityKey::Reference(native.identity()),
        }
    }

    /// Runtime type name of the value, used for substitution lookup.
    /// `None` for null, scalars, optionals and arrays.
    pub fn type_name(&self) -> Option<TypeName> {
        match self {
            Value::String(_) => Some(TypeName::new(well_known::STRING)),
            Value::Enum(e) => Some(e.ty.clone()),
            Value::Object(object) => Some(object.type_name().clone()),
            Value::Metadata(literal) => Some(literal.literal_type().name.clone()),
            _ => None,
        }
    }

    /// Short description of the value's kind, for error messages
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Byte(_) => "byte".to_string(),
            Value::Short(_) => "short".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Enum(e) => e.ty.to_string(),
            Value::Class(_) => "class reference".to_string(),
            Value::Optional(_) => "Optional".to_string(),
            Value::Array(array) => TypeRef::array_of(array.component().clone()).to_string(),
            Value::Object(object) => object.type_name().to_string(),
            Value::Placeholder(_) => "recorded proxy".to_string(),
            Value::MetadataProxy(proxy) => format!("{} metadata proxy", proxy.contract().name()),
            Value::Metadata(literal) => literal.literal_type().name.to_string(),
            Value::Native(_) => "native handle".to_string(),
        }
    }

    /// Whether the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as an object
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow as an array
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen an integral value to `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(n) => Some(i64::from(*n)),
            Value::Short(n) => Some(i64::from(*n)),
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as a placeholder
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Value::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow as a metadata literal
    pub fn as_metadata(&self) -> Option<&Arc<MetadataLiteral>> {
        match self {
            Value::Metadata(literal) => Some(literal),
            _ => None,
        }
    }

    /// Borrow as a native handle
    pub fn as_native(&self) -> Option<&NativeRef> {
        match self {
            Value::Native(native) => Some(native),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Placeholder(a), Value::Placeholder(b)) => a == b,
            (Value::MetadataProxy(a), Value::MetadataProxy(b)) => Arc::ptr_eq(a, b),
            (Value::Metadata(a), Value::Metadata(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Byte(n) => f.debug_tuple("Byte").field(n).finish(),
            Value::Short(n) => f.debug_tuple("Short").field(n).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Long(n) => f.debug_tuple("Long").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::String(s) => f.debug_tuple("String").field(&&**s).finish(),
            Value::Enum(e) => write!(f, "Enum({}.{})", e.ty, e.name),
            Value::Class(name) => write!(f, "Class({})", name),
            Value::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Value::Array(array) => write!(f, "Array({:?})", array),
            Value::Object(object) => write!(f, "Object({:?})", object),
            Value::Placeholder(p) => write!(f, "Placeholder({})", p.key()),
            Value::MetadataProxy(proxy) => write!(f, "MetadataProxy({})", proxy.contract().name()),
            Value::Metadata(literal) => write!(f, "Metadata({:?})", literal),
            Value::Native(native) => write!(f, "{:?}", native),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(n) => write!(f, "{}", n),
            Value::Short(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{}", c),
            Value::String(s) => write!(f, "{}", s),
            Value::Enum(e) => write!(f, "{}", e.name),
            Value::Class(name) => write!(f, "class {}", name),
            Value::Optional(Some(inner)) => write!(f, "Optional[{}]", inner),
            Value::Optional(None) => write!(f, "Optional.empty"),
            Value::Placeholder(p) => write!(f, "{}", p),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<ArrayRef> for Value {
    fn from(array: ArrayRef) -> Self {
        Value::Array(array)
    }
}

impl From<Placeholder> for Value {
    fn from(p: Placeholder) -> Self {
        Value::Placeholder(p)
    }
}

impl From<NativeRef> for Value {
    fn from(native: NativeRef) -> Self {
        Value::Native(native)
    }
}
