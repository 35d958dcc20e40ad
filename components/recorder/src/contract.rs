//! Recorder contracts: the methods a recorder exposes.

use core_types::{TypeName, TypeRef};
use std::sync::Arc;

/// Declared result of a recorder method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// No result
    Void,
    /// A result of the given type
    Value(TypeRef),
}

/// Signature of one recorder method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Declared parameter types
    pub params: Vec<TypeRef>,
    /// Declared result
    pub returns: ReturnType,
}

impl MethodSignature {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether the method returns nothing
    pub fn is_void(&self) -> bool {
        self.returns == ReturnType::Void
    }
}

/// A recorder contract: a stateless type whose calls are recorded at build
/// time and replayed at startup.
///
/// # Examples
///
/// ```
/// use core_types::TypeRef;
/// use recorder::RecorderContract;
///
/// let contract = RecorderContract::new("DataSourceRecorder")
///     .method("configure", [TypeRef::named("String")])
///     .method_returning("create", [], TypeRef::named("DataSource"))
///     .build();
/// assert!(contract.find("configure", 1).is_some());
/// assert!(contract.find("configure", 2).is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderContract {
    name: TypeName,
    methods: Vec<MethodSignature>,
}

impl RecorderContract {
    /// Start a contract with no methods
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: TypeName::new(name),
            methods: Vec::new(),
        }
    }

    /// Declare a void method
    pub fn method(mut self, name: impl Into<String>, params: impl IntoIterator<Item = TypeRef>) -> Self {
        self.methods.push(MethodSignature {
            name: name.into(),
            params: params.into_iter().collect(),
            returns: ReturnType::Void,
        });
        self
    }

    /// Declare a method with a result
    pub fn method_returning(
        mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = TypeRef>,
        returns: TypeRef,
    ) -> Self {
        self.methods.push(MethodSignature {
            name: name.into(),
            params: params.into_iter().collect(),
            returns: ReturnType::Value(returns),
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

    /// Declared methods
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    /// Find a method by name and arity
    pub fn find(&self, name: &str, arity: usize) -> Option<&MethodSignature> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
    }
}
