//! Class descriptors and the class registry.
//!
//! Recorded objects are decomposed by walking their descriptor: which
//! properties are read-only or read-write, which public fields are mutable,
//! whether a no-arg constructor exists. The replay side uses the same
//! descriptors to rebuild instances by name.

use crate::error::{ValueError, ValueResult};
use crate::object::{Members, ObjectRef, ObjectState};
use crate::types::{well_known, TypeName, TypeRef};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Broad shape of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Object with properties and fields
    Bean,
    /// Ordered collection
    List,
    /// Collection without duplicates
    Set,
    /// Key/value mapping
    Map,
    /// Interface; cannot be instantiated
    Interface,
    /// Enumeration with a fixed set of constants
    Enum,
    /// Scalar type such as `String`
    Scalar,
}

/// Whether a property can be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyAccess {
    /// Accessor only
    ReadOnly,
    /// Accessor and mutator
    ReadWrite,
}

/// A property exposed through an accessor and optional mutator
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Access mode
    pub access: PropertyAccess,
}

impl PropertyDescriptor {
    /// Whether the property has no mutator
    pub fn is_read_only(&self) -> bool {
        self.access == PropertyAccess::ReadOnly
    }
}

/// A field declared directly on a class
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Publicly visible
    pub is_public: bool,
    /// Cannot be reassigned
    pub is_final: bool,
    /// Belongs to the class rather than instances
    pub is_static: bool,
}

impl FieldDescriptor {
    /// A public, mutable instance field
    pub fn public(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_public: true,
            is_final: false,
            is_static: false,
        }
    }

    /// Whether the field is public, non-final and non-static
    pub fn is_public_mutable(&self) -> bool {
        self.is_public && !self.is_final && !self.is_static
    }
}

/// One constructor parameter, bound to the member it initializes
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorParam {
    /// Property or field initialized from this parameter
    pub member: String,
    /// Declared parameter type
    pub ty: TypeRef,
}

/// An explicit (non-default) constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// Positional parameters
    pub params: Vec<ConstructorParam>,
}

impl ConstructorDescriptor {
    /// Build a constructor from `(member, type)` pairs
    pub fn new<S: Into<String>>(params: impl IntoIterator<Item = (S, TypeRef)>) -> Self {
        Self {
            params: params
                .into_iter()
                .map(|(member, ty)| ConstructorParam {
                    member: member.into(),
                    ty,
                })
                .collect(),
        }
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameter types, in order
    pub fn param_types(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }
}

/// Description of a class: its shape, members and constructors.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    name: TypeName,
    kind: ClassKind,
    is_final: bool,
    is_immutable: bool,
    has_default_constructor: bool,
    supertypes: Vec<TypeName>,
    properties: Vec<PropertyDescriptor>,
    fields: Vec<FieldDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    enum_constants: Vec<String>,
}

impl ClassDescriptor {
    /// Start describing a bean class
    pub fn bean(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Bean)
    }

    /// Start describing an interface
    pub fn interface(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name, ClassKind::Interface).without_default_constructor()
    }

    /// Describe an enum with the given constants
    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        constants: impl IntoIterator<Item = S>,
    ) -> Arc<Self> {
        let mut builder = ClassBuilder::new(name, ClassKind::Enum)
            .final_class()
            .without_default_constructor();
        for constant in constants {
            builder = builder.constant(constant);
        }
        builder.build()
    }

    /// Start describing a class of an arbitrary kind
    pub fn of_kind(name: impl Into<String>, kind: ClassKind) -> ClassBuilder {
        ClassBuilder::new(name, kind)
    }

    /// Class name
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Class kind
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether the class is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Whether the class cannot be subclassed
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Whether instances reject mutation
    pub fn is_immutable(&self) -> bool {
        self.is_immutable
    }

    /// Whether a no-arg constructor is available
    pub fn has_default_constructor(&self) -> bool {
        self.has_default_constructor
    }

    /// Whether instances are collections (lists or sets)
    pub fn is_collection(&self) -> bool {
        matches!(self.kind, ClassKind::List | ClassKind::Set)
    }

    /// Whether instances are maps
    pub fn is_map(&self) -> bool {
        self.kind == ClassKind::Map
    }

    /// Declared properties
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Declared fields
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Explicit constructors
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Enum constants, for enum classes
    pub fn enum_constants(&self) -> &[String] {
        &self.enum_constants
    }

    /// Direct supertypes
    pub fn supertypes(&self) -> &[TypeName] {
        &self.supertypes
    }

    /// Find a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a constructor whose parameter types equal `types`
    pub fn constructor_matching(&self, types: &[TypeRef]) -> Option<&ConstructorDescriptor> {
        self.constructors
            .iter()
            .find(|c| c.params.len() == types.len() && c.params.iter().zip(types).all(|(p, t)| &p.ty == t))
    }

    /// Whether this class is, or directly implements, `name`
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.name.is(name) || self.supertypes.iter().any(|s| s.is(name))
    }

    /// Whether the enum declares the given constant
    pub fn has_constant(&self, name: &str) -> bool {
        self.enum_constants.iter().any(|c| c == name)
    }

    /// Create an instance through the no-arg constructor
    pub fn instantiate(self: &Arc<Self>) -> ValueResult<ObjectRef> {
        if self.is_interface() {
            return Err(ValueError::AbstractType(self.name.clone()));
        }
        if !self.has_default_constructor {
            return Err(ValueError::NoDefaultConstructor(self.name.clone()));
        }
        Ok(ObjectRef::new(self.clone(), self.default_state()?))
    }

    /// Create an instance through the constructor whose parameter types
    /// equal `types`, binding each argument to its member
    pub fn instantiate_with(
        self: &Arc<Self>,
        types: &[TypeRef],
        args: Vec<Value>,
    ) -> ValueResult<ObjectRef> {
        if self.is_interface() {
            return Err(ValueError::AbstractType(self.name.clone()));
        }
        let constructor =
            self.constructor_matching(types)
                .ok_or_else(|| ValueError::NoMatchingConstructor {
                    ty: self.name.clone(),
                    arity: types.len(),
                })?;
        if constructor.arity() != args.len() {
            return Err(ValueError::NoMatchingConstructor {
                ty: self.name.clone(),
                arity: args.len(),
            });
        }
        let object = ObjectRef::new(self.clone(), self.default_state()?);
        for (param, arg) in constructor.params.iter().zip(args) {
            object.init_member(&param.member, arg)?;
        }
        Ok(object)
    }

    fn default_state(&self) -> ValueResult<ObjectState> {
        match self.kind {
            ClassKind::List => Ok(ObjectState::List(Vec::new())),
            ClassKind::Set => Ok(ObjectState::Set(Vec::new())),
            ClassKind::Map => Ok(ObjectState::Map(Vec::new())),
            ClassKind::Bean => {
                let mut members = Members::default();
                for property in &self.properties {
                    members
                        .properties
                        .push((property.name.clone(), default_member_value(&property.ty, property.is_read_only())?));
                }
                for field in self.fields.iter().filter(|f| !f.is_static) {
                    members
                        .fields
                        .push((field.name.clone(), default_member_value(&field.ty, false)?));
                }
                Ok(ObjectState::Bean(members))
            }
            ClassKind::Interface => Err(ValueError::AbstractType(self.name.clone())),
            ClassKind::Enum | ClassKind::Scalar => {
                Err(ValueError::NoDefaultConstructor(self.name.clone()))
            }
        }
    }
}

/// Initial member value of a default-constructed bean: zero for primitives,
/// a fresh empty container for read-only container properties, null otherwise.
fn default_member_value(ty: &TypeRef, read_only: bool) -> ValueResult<Value> {
    if let TypeRef::Primitive(p) = ty {
        return Ok(Value::zero_of(*p));
    }
    if read_only {
        let concrete = if ty.is_list_like() {
            Some(well_known::ARRAY_LIST)
        } else if ty.is_set_like() {
            Some(well_known::LINKED_HASH_SET)
        } else if ty.is_map_like() {
            Some(well_known::LINKED_HASH_MAP)
        } else {
            None
        };
        if let Some(name) = concrete {
            let class = builtin(name).ok_or_else(|| ValueError::UnknownClass(TypeName::new(name)))?;
            return Ok(Value::Object(class.instantiate()?));
        }
    }
    Ok(Value::Null)
}

/// Builder for [`ClassDescriptor`]
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    class: ClassDescriptor,
}

impl ClassBuilder {
    /// Start a descriptor of the given kind with a default constructor
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            class: ClassDescriptor {
                name: TypeName::new(name),
                kind,
                is_final: false,
                is_immutable: false,
                has_default_constructor: true,
                supertypes: Vec::new(),
                properties: Vec::new(),
                fields: Vec::new(),
                constructors: Vec::new(),
                enum_constants: Vec::new(),
            },
        }
    }

    /// Mark the class final
    pub fn final_class(mut self) -> Self {
        self.class.is_final = true;
        self
    }

    /// Mark instances immutable
    pub fn immutable(mut self) -> Self {
        self.class.is_immutable = true;
        self
    }

    /// Remove the no-arg constructor
    pub fn without_default_constructor(mut self) -> Self {
        self.class.has_default_constructor = false;
        self
    }

    /// Add a supertype
    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.class.supertypes.push(TypeName::new(name));
        self
    }

    /// Add a read-write property
    pub fn property(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.class.properties.push(PropertyDescriptor {
            name: name.into(),
            ty,
            access: PropertyAccess::ReadWrite,
        });
        self
    }

    /// Add a read-only property
    pub fn read_only(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.class.properties.push(PropertyDescriptor {
            name: name.into(),
            ty,
            access: PropertyAccess::ReadOnly,
        });
        self
    }

    /// Add a public mutable field
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.class.fields.push(FieldDescriptor::public(name, ty));
        self
    }

    /// Add a field with explicit modifiers
    pub fn field_with(mut self, field: FieldDescriptor) -> Self {
        self.class.fields.push(field);
        self
    }

    /// Add an explicit constructor
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.class.constructors.push(constructor);
        self
    }

    /// Add an enum constant
    pub fn constant(mut self, name: impl Into<String>) -> Self {
        self.class.enum_constants.push(name.into());
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(self.class)
    }
}

fn builtin_classes() -> &'static HashMap<TypeName, Arc<ClassDescriptor>> {
    static BUILTINS: OnceLock<HashMap<TypeName, Arc<ClassDescriptor>>> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        use well_known::*;
        let list = |name: &str| ClassDescriptor::of_kind(name, ClassKind::List).implements(LIST).implements(COLLECTION);
        let set = |name: &str| ClassDescriptor::of_kind(name, ClassKind::Set).implements(SET).implements(COLLECTION);
        let map = |name: &str| ClassDescriptor::of_kind(name, ClassKind::Map).implements(MAP);
        let frozen = |builder: ClassBuilder| builder.final_class().immutable().without_default_constructor().build();

        let classes = vec![
            ClassDescriptor::interface(COLLECTION).build(),
            ClassDescriptor::interface(LIST).implements(COLLECTION).build(),
            ClassDescriptor::interface(SET).implements(COLLECTION).build(),
            ClassDescriptor::interface(MAP).build(),
            list(ARRAY_LIST).build(),
            set(LINKED_HASH_SET).build(),
            set(HASH_SET).build(),
            map(LINKED_HASH_MAP).build(),
            map(HASH_MAP).build(),
            frozen(list(EMPTY_LIST)),
            frozen(list(SINGLETON_LIST)),
            frozen(list(UNMODIFIABLE_LIST)),
            frozen(set(EMPTY_SET)),
            frozen(set(SINGLETON_SET)),
            frozen(set(UNMODIFIABLE_SET)),
            frozen(map(EMPTY_MAP)),
            frozen(map(SINGLETON_MAP)),
            frozen(map(UNMODIFIABLE_MAP)),
            ClassDescriptor::of_kind(STRING, ClassKind::Scalar)
                .final_class()
                .without_default_constructor()
                .build(),
        ];
        classes.into_iter().map(|c| (c.name().clone(), c)).collect()
    })
}

/// Descriptor of a built-in class, if `name` is one
pub fn builtin(name: &str) -> Option<Arc<ClassDescriptor>> {
    builtin_classes().get(&TypeName::new(name)).cloned()
}

/// Registry of class descriptors, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<TypeName, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in container and scalar classes
    pub fn with_builtins() -> Self {
        Self {
            classes: builtin_classes().clone(),
        }
    }

    /// Register (or replace) a class descriptor
    pub fn register(&mut self, class: Arc<ClassDescriptor>) -> &mut Self {
        self.classes.insert(class.name().clone(), class);
        self
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(&TypeName::new(name))
    }

    /// Look up a class by name, failing if it is not registered
    pub fn require(&self, name: &TypeName) -> ValueResult<&Arc<ClassDescriptor>> {
        self.classes
            .get(name)
            .ok_or_else(|| ValueError::UnknownClass(name.clone()))
    }

    /// Whether a class is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
