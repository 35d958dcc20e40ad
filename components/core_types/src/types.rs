//! Type names and type references.
//!
//! Recorded values and recorder method signatures refer to types by name.
//! A [`TypeRef`] is the declared ("expected") type of a parameter, property
//! or element, and drives several resolution decisions: substitutions keyed
//! by the declared type, array component types, and the fallback concrete
//! container chosen for values without a usable constructor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the built-in container and scalar types.
pub mod well_known {
    /// Root collection interface
    pub const COLLECTION: &str = "Collection";
    /// Ordered collection interface
    pub const LIST: &str = "List";
    /// Set interface
    pub const SET: &str = "Set";
    /// Map interface
    pub const MAP: &str = "Map";
    /// Growable list
    pub const ARRAY_LIST: &str = "ArrayList";
    /// Insertion-ordered map
    pub const LINKED_HASH_MAP: &str = "LinkedHashMap";
    /// Hash map
    pub const HASH_MAP: &str = "HashMap";
    /// Insertion-ordered set
    pub const LINKED_HASH_SET: &str = "LinkedHashSet";
    /// Hash set
    pub const HASH_SET: &str = "HashSet";
    /// Immutable empty list
    pub const EMPTY_LIST: &str = "EmptyList";
    /// Immutable empty set
    pub const EMPTY_SET: &str = "EmptySet";
    /// Immutable empty map
    pub const EMPTY_MAP: &str = "EmptyMap";
    /// Immutable one-element list
    pub const SINGLETON_LIST: &str = "SingletonList";
    /// Immutable one-element set
    pub const SINGLETON_SET: &str = "SingletonSet";
    /// Immutable one-entry map
    pub const SINGLETON_MAP: &str = "SingletonMap";
    /// Read-only list view
    pub const UNMODIFIABLE_LIST: &str = "UnmodifiableList";
    /// Read-only set view
    pub const UNMODIFIABLE_SET: &str = "UnmodifiableSet";
    /// Read-only map view
    pub const UNMODIFIABLE_MAP: &str = "UnmodifiableMap";
    /// String type
    pub const STRING: &str = "String";
    /// Optional value holder
    pub const OPTIONAL: &str = "Optional";
}

/// Nominal name of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name equals the given string
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Primitive scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int,
    /// Signed 64-bit integer
    Long,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Unicode scalar
    Char,
}

impl PrimitiveType {
    /// Canonical name used in class references
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Char => "char",
        }
    }

    /// Look up a primitive type by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PrimitiveType::Bool,
            "byte" => PrimitiveType::Byte,
            "short" => PrimitiveType::Short,
            "int" => PrimitiveType::Int,
            "long" => PrimitiveType::Long,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            "char" => PrimitiveType::Char,
            _ => return None,
        })
    }
}

/// Declared type of a parameter, property, field or element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// Any reference type
    Any,
    /// A primitive scalar
    Primitive(PrimitiveType),
    /// A named class, interface or enum
    Named(TypeName),
    /// An array with the given component type
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// Shorthand for a named type
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(TypeName::new(name))
    }

    /// Shorthand for an array type
    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    /// The name of a named type
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            TypeRef::Named(name) => Some(name),
            _ => None,
        }
    }

    /// The component type of an array type
    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Whether this is the named type `name`
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, TypeRef::Named(n) if n.is(name))
    }

    /// Whether the declared type is one of the list-like interfaces
    pub fn is_list_like(&self) -> bool {
        self.is_named(well_known::LIST) || self.is_named(well_known::COLLECTION)
    }

    /// Whether the declared type is the set interface
    pub fn is_set_like(&self) -> bool {
        self.is_named(well_known::SET)
    }

    /// Whether the declared type is the map interface
    pub fn is_map_like(&self) -> bool {
        self.is_named(well_known::MAP)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Any => write!(f, "Any"),
            TypeRef::Primitive(p) => write!(f, "{}", p.name()),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Array(component) => write!(f, "{}[]", component),
        }
    }
}
