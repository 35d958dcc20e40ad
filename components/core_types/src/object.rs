//! Shared, mutable object and array storage.
//!
//! Objects and arrays are reference values: cloning an [`ObjectRef`] clones
//! the handle, not the object, and two handles to the same object compare
//! identical under [`ObjectRef::ptr_eq`]. Identity is what the recorder
//! deduplicates on, so shared and cyclic graphs keep their shape through a
//! record/replay round trip.

use crate::class::ClassDescriptor;
use crate::error::{ValueError, ValueResult};
use crate::types::{TypeName, TypeRef};
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Property and field values of a bean, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Members {
    /// Property values
    pub properties: Vec<(String, Value)>,
    /// Field values
    pub fields: Vec<(String, Value)>,
}

impl Members {
    fn slot<'a>(entries: &'a mut [(String, Value)], name: &str) -> Option<&'a mut Value> {
        entries.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn lookup<'a>(entries: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
        entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// State of an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectState {
    /// Bean members
    Bean(Members),
    /// List elements, in order
    List(Vec<Value>),
    /// Set elements, in insertion order
    Set(Vec<Value>),
    /// Map entries, in insertion order
    Map(Vec<(Value, Value)>),
}

struct ObjectCell {
    class: Arc<ClassDescriptor>,
    state: RwLock<ObjectState>,
}

/// Shared handle to an object
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

impl ObjectRef {
    /// Wrap a state into a new object of `class`
    pub fn new(class: Arc<ClassDescriptor>, state: ObjectState) -> Self {
        Self(Arc::new(ObjectCell {
            class,
            state: RwLock::new(state),
        }))
    }

    /// Build a list object of `class` holding `items`
    pub fn list(class: Arc<ClassDescriptor>, items: Vec<Value>) -> Self {
        Self::new(class, ObjectState::List(items))
    }

    /// Build a set object of `class` holding `items`
    pub fn set(class: Arc<ClassDescriptor>, items: Vec<Value>) -> Self {
        Self::new(class, ObjectState::Set(items))
    }

    /// Build a map object of `class` holding `entries`
    pub fn map(class: Arc<ClassDescriptor>, entries: Vec<(Value, Value)>) -> Self {
        Self::new(class, ObjectState::Map(entries))
    }

    /// The object's class
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.0.class
    }

    /// The object's class name
    pub fn type_name(&self) -> &TypeName {
        self.0.class.name()
    }

    /// Whether both handles refer to the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity of the object
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ObjectState {
        self.0.state.read_recursive().clone()
    }

    /// Elements of a list or set
    pub fn elements(&self) -> ValueResult<Vec<Value>> {
        match &*self.0.state.read_recursive() {
            ObjectState::List(items) | ObjectState::Set(items) => Ok(items.clone()),
            _ => Err(ValueError::NotACollection(self.type_name().clone())),
        }
    }

    /// Entries of a map
    pub fn entries(&self) -> ValueResult<Vec<(Value, Value)>> {
        match &*self.0.state.read_recursive() {
            ObjectState::Map(entries) => Ok(entries.clone()),
            _ => Err(ValueError::NotAMap(self.type_name().clone())),
        }
    }

    /// Number of elements or entries; zero for beans
    pub fn len(&self) -> usize {
        match &*self.0.state.read_recursive() {
            ObjectState::List(items) | ObjectState::Set(items) => items.len(),
            ObjectState::Map(entries) => entries.len(),
            ObjectState::Bean(_) => 0,
        }
    }

    /// Whether the collection or map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to a list, or insert into a set when not already present
    pub fn add(&self, value: Value) -> ValueResult<()> {
        self.check_mutable()?;
        let present = match &*self.0.state.read_recursive() {
            ObjectState::List(_) => false,
            ObjectState::Set(items) => items.iter().any(|i| i == &value),
            _ => return Err(ValueError::NotACollection(self.type_name().clone())),
        };
        if !present {
            if let ObjectState::List(items) | ObjectState::Set(items) = &mut *self.0.state.write() {
                items.push(value);
            }
        }
        Ok(())
    }

    /// Insert or replace a map entry
    pub fn put(&self, key: Value, value: Value) -> ValueResult<()> {
        self.check_mutable()?;
        let position = match &*self.0.state.read_recursive() {
            ObjectState::Map(entries) => entries.iter().position(|(k, _)| k == &key),
            _ => return Err(ValueError::NotAMap(self.type_name().clone())),
        };
        if let ObjectState::Map(entries) = &mut *self.0.state.write() {
            match position {
                Some(index) => entries[index].1 = value,
                None => entries.push((key, value)),
            }
        }
        Ok(())
    }

    /// Look up a map entry
    pub fn get(&self, key: &Value) -> ValueResult<Option<Value>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    /// Read a property through its accessor
    pub fn get_property(&self, name: &str) -> ValueResult<Value> {
        self.require_property(name)?;
        match &*self.0.state.read_recursive() {
            ObjectState::Bean(members) => Ok(Members::lookup(&members.properties, name)
                .cloned()
                .unwrap_or(Value::Null)),
            _ => Err(ValueError::NotABean(self.type_name().clone())),
        }
    }

    /// Write a property through its mutator
    pub fn set_property(&self, name: &str, value: Value) -> ValueResult<()> {
        let property = self.require_property(name)?;
        if property.is_read_only() {
            return Err(ValueError::ReadOnlyProperty {
                ty: self.type_name().clone(),
                property: name.to_string(),
            });
        }
        self.store_property(name, value)
    }

    /// Read a field
    pub fn get_field(&self, name: &str) -> ValueResult<Value> {
        self.require_field(name)?;
        match &*self.0.state.read_recursive() {
            ObjectState::Bean(members) => {
                Ok(Members::lookup(&members.fields, name).cloned().unwrap_or(Value::Null))
            }
            _ => Err(ValueError::NotABean(self.type_name().clone())),
        }
    }

    /// Write a public mutable field
    pub fn set_field(&self, name: &str, value: Value) -> ValueResult<()> {
        let field = self.require_field(name)?;
        if !field.is_public_mutable() {
            return Err(ValueError::FieldNotWritable {
                ty: self.type_name().clone(),
                field: name.to_string(),
            });
        }
        self.store_field(name, value)
    }

    /// Initialize a property or field regardless of its access mode.
    /// Used by constructors.
    pub fn init_member(&self, name: &str, value: Value) -> ValueResult<()> {
        if self.class().property(name).is_some() {
            self.store_property(name, value)
        } else if self.class().field(name).is_some() {
            self.store_field(name, value)
        } else {
            Err(ValueError::NoSuchProperty {
                ty: self.type_name().clone(),
                property: name.to_string(),
            })
        }
    }

    fn store_property(&self, name: &str, value: Value) -> ValueResult<()> {
        match &mut *self.0.state.write() {
            ObjectState::Bean(members) => {
                match Members::slot(&mut members.properties, name) {
                    Some(slot) => *slot = value,
                    None => members.properties.push((name.to_string(), value)),
                }
                Ok(())
            }
            _ => Err(ValueError::NotABean(self.type_name().clone())),
        }
    }

    fn store_field(&self, name: &str, value: Value) -> ValueResult<()> {
        match &mut *self.0.state.write() {
            ObjectState::Bean(members) => {
                match Members::slot(&mut members.fields, name) {
                    Some(slot) => *slot = value,
                    None => members.fields.push((name.to_string(), value)),
                }
                Ok(())
            }
            _ => Err(ValueError::NotABean(self.type_name().clone())),
        }
    }

    fn require_property(&self, name: &str) -> ValueResult<&crate::class::PropertyDescriptor> {
        self.class()
            .property(name)
            .ok_or_else(|| ValueError::NoSuchProperty {
                ty: self.type_name().clone(),
                property: name.to_string(),
            })
    }

    fn require_field(&self, name: &str) -> ValueResult<&crate::class::FieldDescriptor> {
        self.class().field(name).ok_or_else(|| ValueError::NoSuchField {
            ty: self.type_name().clone(),
            field: name.to_string(),
        })
    }

    fn check_mutable(&self) -> ValueResult<()> {
        if self.class().is_immutable() {
            Err(ValueError::Immutable(self.type_name().clone()))
        } else {
            Ok(())
        }
    }
}

/// Objects compare equal when they are the same object, or when they have
/// the same class and equal state. Comparing self-referential graphs that
/// are not the same object does not terminate.
impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.type_name() == other.type_name()
            && *self.0.state.read_recursive() == *other.0.state.read_recursive()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.type_name(), self.identity())
    }
}

struct ArrayCell {
    component: TypeRef,
    elements: RwLock<Vec<Value>>,
}

/// Shared handle to a fixed-length array
#[derive(Clone)]
pub struct ArrayRef(Arc<ArrayCell>);

impl ArrayRef {
    /// Allocate an array of `len` default elements
    pub fn allocate(component: TypeRef, len: usize) -> Self {
        let fill = match &component {
            TypeRef::Primitive(p) => Value::zero_of(*p),
            _ => Value::Null,
        };
        Self::from_elements(component, vec![fill; len])
    }

    /// Wrap existing elements
    pub fn from_elements(component: TypeRef, elements: Vec<Value>) -> Self {
        Self(Arc::new(ArrayCell {
            component,
            elements: RwLock::new(elements),
        }))
    }

    /// Component type
    pub fn component(&self) -> &TypeRef {
        &self.0.component
    }

    /// Array length
    pub fn len(&self) -> usize {
        self.0.elements.read_recursive().len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the elements
    pub fn elements(&self) -> Vec<Value> {
        self.0.elements.read_recursive().clone()
    }

    /// Read one element
    pub fn get(&self, index: usize) -> ValueResult<Value> {
        let elements = self.0.elements.read_recursive();
        elements
            .get(index)
            .cloned()
            .ok_or(ValueError::IndexOutOfBounds {
                index,
                len: elements.len(),
            })
    }

    /// Write one element
    pub fn set(&self, index: usize, value: Value) -> ValueResult<()> {
        let mut elements = self.0.elements.write();
        let len = elements.len();
        let slot = elements
            .get_mut(index)
            .ok_or(ValueError::IndexOutOfBounds { index, len })?;
        *slot = value;
        Ok(())
    }

    /// Whether both handles refer to the same array
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address-based identity of the array
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.component() == other.component()
                && *self.0.elements.read_recursive() == *other.0.elements.read_recursive())
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]@{:x}", self.component(), self.len(), self.identity())
    }
}
