//! Errors raised by the value and type model.
//!
//! These are raised both while decomposing values at record time and while
//! rebuilding them at replay time.

use crate::types::TypeName;
use thiserror::Error;

/// Error raised by an operation on a value, object or class descriptor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The class declares no property with this name
    #[error("{ty} has no property named '{property}'")]
    NoSuchProperty {
        /// Declaring type
        ty: TypeName,
        /// Property name
        property: String,
    },

    /// The property has no mutator
    #[error("property '{property}' of {ty} is read-only")]
    ReadOnlyProperty {
        /// Declaring type
        ty: TypeName,
        /// Property name
        property: String,
    },

    /// The class declares no field with this name
    #[error("{ty} has no field named '{field}'")]
    NoSuchField {
        /// Declaring type
        ty: TypeName,
        /// Field name
        field: String,
    },

    /// The field is final or static
    #[error("field '{field}' of {ty} is not writable")]
    FieldNotWritable {
        /// Declaring type
        ty: TypeName,
        /// Field name
        field: String,
    },

    /// A collection operation on something that is not a collection
    #[error("{0} is not a collection")]
    NotACollection(TypeName),

    /// A map operation on something that is not a map
    #[error("{0} is not a map")]
    NotAMap(TypeName),

    /// A member operation on something that is not a bean
    #[error("{0} has no properties or fields")]
    NotABean(TypeName),

    /// Mutation of an immutable container
    #[error("unsupported operation: {0} is immutable")]
    Immutable(TypeName),

    /// Construction of a class without a no-arg constructor
    #[error("no default constructor available for {0}")]
    NoDefaultConstructor(TypeName),

    /// No constructor matches the requested signature
    #[error("{ty} has no constructor taking {arity} argument(s) of the requested types")]
    NoMatchingConstructor {
        /// Type being constructed
        ty: TypeName,
        /// Number of arguments requested
        arity: usize,
    },

    /// Interfaces cannot be instantiated
    #[error("{0} is an interface and cannot be instantiated")]
    AbstractType(TypeName),

    /// Anything other than the key or phase accessor was used on a placeholder
    #[error("cannot invoke {method}() on {label}: recorded proxies may only be passed back into the recorder")]
    RecordedProxyMisuse {
        /// Method that was attempted
        method: String,
        /// Diagnostic label of the placeholder
        label: String,
    },

    /// Array index out of range
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Array length
        len: usize,
    },

    /// A value did not have the expected shape
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation needed
        expected: String,
        /// What it got
        found: String,
    },

    /// A class name is not registered
    #[error("class not found: {0}")]
    UnknownClass(TypeName),

    /// A substitution failed to convert a value
    #[error("substitution failed: {0}")]
    Substitution(String),
}

/// Result alias for value operations
pub type ValueResult<T> = Result<T, ValueError>;
