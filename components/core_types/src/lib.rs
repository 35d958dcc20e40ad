//! Value and type model shared by the recorder and the replay VM.
//!
//! This crate provides the data that flows through a startup recording:
//! dynamic values, shared objects and arrays, class descriptors standing in
//! for reflection, placeholders for recorded call results, declarative
//! metadata, and object substitutions.
//!
//! # Overview
//!
//! - [`Value`] - Any recordable or replayable value
//! - [`ObjectRef`] / [`ArrayRef`] - Shared, identity-carrying containers
//! - [`ClassDescriptor`] / [`ClassRegistry`] - Class shapes, looked up by name
//! - [`Placeholder`] - Stand-in for the result of a recorded call
//! - [`MetadataContract`] / [`MetadataInstance`] - Declarative metadata
//! - [`ObjectSubstitution`] - Serialized stand-ins for opaque types
//! - [`ValueError`] - Errors raised by all of the above
//!
//! # Examples
//!
//! ```
//! use core_types::{ClassDescriptor, TypeRef, Value};
//!
//! let class = ClassDescriptor::bean("Endpoint")
//!     .property("path", TypeRef::named("String"))
//!     .build();
//! let endpoint = class.instantiate().unwrap();
//! endpoint.set_property("path", Value::from("/health")).unwrap();
//! assert_eq!(endpoint.get_property("path").unwrap(), Value::from("/health"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod class;
mod error;
mod metadata;
mod object;
mod placeholder;
mod substitution;
mod types;
mod value;

pub use class::{
    builtin, ClassBuilder, ClassDescriptor, ClassKind, ClassRegistry, ConstructorDescriptor,
    ConstructorParam, FieldDescriptor, PropertyAccess, PropertyDescriptor,
};
pub use error::{ValueError, ValueResult};
pub use metadata::{
    ElementDeclaration, LiteralElement, LiteralType, MetadataContract, MetadataInstance,
    MetadataLiteral, MetadataProxy,
};
pub use object::{ArrayRef, Members, ObjectRef, ObjectState};
pub use placeholder::Placeholder;
pub use substitution::{FnSubstitution, ObjectSubstitution};
pub use types::{well_known, PrimitiveType, TypeName, TypeRef};
pub use value::{EnumConstant, IdentityKey, NativeRef, Value};
