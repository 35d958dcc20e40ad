//! Declarative metadata: contracts, instances and literal types.
//!
//! A [`MetadataContract`] declares named, typed elements, some with default
//! values. A [`MetadataInstance`] is one occurrence of that contract on a
//! declaration, carrying the values that were written out explicitly. To
//! pass an instance through a recorder it is wrapped in a
//! [`MetadataProxy`], which pairs it with a synthesized [`LiteralType`]: a
//! nominal type with one element per declared element and a positional
//! constructor. At replay time the literal is rebuilt as a
//! [`MetadataLiteral`].

use crate::error::{ValueError, ValueResult};
use crate::types::{TypeName, TypeRef};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One element declared by a metadata contract
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDeclaration {
    /// Element name
    pub name: String,
    /// Element type
    pub ty: TypeRef,
    /// Declared default, if any
    pub default: Option<Value>,
}

/// A metadata contract: the declared elements of one kind of metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataContract {
    name: TypeName,
    elements: Vec<ElementDeclaration>,
}

impl MetadataContract {
    /// Start a contract with no elements
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: TypeName::new(name),
            elements: Vec::new(),
        }
    }

    /// Declare an element without a default
    pub fn element(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.elements.push(ElementDeclaration {
            name: name.into(),
            ty,
            default: None,
        });
        self
    }

    /// Declare an element with a default value
    pub fn element_with_default(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        default: Value,
    ) -> Self {
        self.elements.push(ElementDeclaration {
            name: name.into(),
            ty,
            default: Some(default),
        });
        self
    }

    /// Finish the contract
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Contract name
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Declared elements, in declaration order
    pub fn elements(&self) -> &[ElementDeclaration] {
        &self.elements
    }

    /// Find a declared element
    pub fn element_named(&self, name: &str) -> Option<&ElementDeclaration> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// One occurrence of a metadata contract on a declaration
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataInstance {
    contract: TypeName,
    target: String,
    values: Vec<(String, Value)>,
}

impl MetadataInstance {
    /// Start an instance of the named contract
    pub fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: TypeName::new(contract),
            target: String::new(),
            values: Vec::new(),
        }
    }

    /// Name the declaration the instance is attached to
    pub fn on(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set an explicit element value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((name.into(), value.into()));
        self
    }

    /// Name of the contract this instance claims to be
    pub fn contract(&self) -> &TypeName {
        &self.contract
    }

    /// Declaration the instance is attached to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Explicit element values
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Explicit value of one element
    pub fn explicit(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// One element of a literal type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralElement {
    /// Element name
    pub name: String,
    /// Element type, also the constructor parameter type
    pub ty: TypeRef,
}

/// Synthesized nominal type implementing a metadata contract.
///
/// Constructor parameters follow the element order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralType {
    /// Literal type name
    pub name: TypeName,
    /// Contract the type implements
    pub contract: TypeName,
    /// Elements, in declaration order
    pub elements: Vec<LiteralElement>,
}

impl LiteralType {
    /// Synthesize the literal type for a contract
    pub fn for_contract(contract: &MetadataContract) -> Self {
        Self {
            name: TypeName::new(format!("{}$Literal", contract.name())),
            contract: contract.name().clone(),
            elements: contract
                .elements()
                .iter()
                .map(|e| LiteralElement {
                    name: e.name.clone(),
                    ty: e.ty.clone(),
                })
                .collect(),
        }
    }

    /// Constructor parameter types
    pub fn param_types(&self) -> Vec<TypeRef> {
        self.elements.iter().map(|e| e.ty.clone()).collect()
    }
}

/// Record-time request to reconstruct a metadata instance as a literal.
#[derive(Debug, Clone)]
pub struct MetadataProxy {
    literal_type: Arc<LiteralType>,
    contract: Arc<MetadataContract>,
    instance: MetadataInstance,
    defaults: Vec<(String, Value)>,
}

impl MetadataProxy {
    /// Pair an instance with its literal type and caller-supplied defaults
    pub fn new(
        literal_type: Arc<LiteralType>,
        contract: Arc<MetadataContract>,
        instance: MetadataInstance,
        defaults: Vec<(String, Value)>,
    ) -> Self {
        Self {
            literal_type,
            contract,
            instance,
            defaults,
        }
    }

    /// The literal type that will be constructed
    pub fn literal_type(&self) -> &Arc<LiteralType> {
        &self.literal_type
    }

    /// The contract description
    pub fn contract(&self) -> &Arc<MetadataContract> {
        &self.contract
    }

    /// The originating instance
    pub fn instance(&self) -> &MetadataInstance {
        &self.instance
    }

    /// Caller-supplied defaults
    pub fn defaults(&self) -> &[(String, Value)] {
        &self.defaults
    }

    /// Caller-supplied default for one element
    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.defaults.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// A rebuilt metadata literal: a literal type plus one value per element
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataLiteral {
    literal_type: Arc<LiteralType>,
    values: Vec<Value>,
}

impl MetadataLiteral {
    /// Construct a literal through its positional constructor
    pub fn new(literal_type: Arc<LiteralType>, values: Vec<Value>) -> ValueResult<Self> {
        if values.len() != literal_type.elements.len() {
            return Err(ValueError::NoMatchingConstructor {
                ty: literal_type.name.clone(),
                arity: values.len(),
            });
        }
        Ok(Self {
            literal_type,
            values,
        })
    }

    /// The literal type
    pub fn literal_type(&self) -> &Arc<LiteralType> {
        &self.literal_type
    }

    /// Read an element by name
    pub fn element(&self, name: &str) -> Option<&Value> {
        self.literal_type
            .elements
            .iter()
            .position(|e| e.name == name)
            .and_then(|i| self.values.get(i))
    }

    /// Element values, in declaration order
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}
