//! What the replay VM needs from the running application: classes,
//! recorder implementations, substitutions and static functions.

use crate::context::StartupContext;
use crate::error::{ReplayError, ReplayResult};
use core_types::{ClassRegistry, NativeRef, ObjectSubstitution, PrimitiveType, TypeName, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Replay-side implementation of a recorder contract
pub trait RecorderTarget: Send + Sync {
    /// Execute one recorded call
    fn invoke(
        &self,
        method: &str,
        args: Vec<Value>,
        context: &StartupContext,
    ) -> ReplayResult<Option<Value>>;
}

/// Builds a recorder instance
pub type RecorderFactory = dyn Fn() -> Arc<dyn RecorderTarget> + Send + Sync;

/// Function callable from emitted steps
pub type StaticFunction = dyn Fn(&[Value], &StartupContext) -> ReplayResult<Value> + Send + Sync;

/// A constructed recorder, carried through registers and slots as a
/// native value
#[derive(Clone)]
pub struct RecorderHandle {
    contract: TypeName,
    target: Arc<dyn RecorderTarget>,
}

impl RecorderHandle {
    /// Contract the recorder implements
    pub fn contract(&self) -> &TypeName {
        &self.contract
    }

    /// The recorder
    pub fn target(&self) -> &Arc<dyn RecorderTarget> {
        &self.target
    }

    /// Extract the handle from a value built by [`RuntimeRegistry::new_recorder`]
    pub fn from_value(value: &Value) -> Option<&RecorderHandle> {
        value.as_native()?.downcast_ref::<RecorderHandle>()
    }
}

impl fmt::Debug for RecorderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecorderHandle({})", self.contract)
    }
}

/// Registry consulted while replaying
pub struct RuntimeRegistry {
    classes: ClassRegistry,
    recorders: HashMap<TypeName, Arc<RecorderFactory>>,
    substitutions: HashMap<String, Arc<dyn ObjectSubstitution>>,
    functions: HashMap<String, Arc<StaticFunction>>,
}

impl RuntimeRegistry {
    /// Registry over `classes`
    pub fn new(classes: ClassRegistry) -> Self {
        Self {
            classes,
            recorders: HashMap::new(),
            substitutions: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Registry holding only the built-in classes
    pub fn with_builtins() -> Self {
        Self::new(ClassRegistry::with_builtins())
    }

    /// Class registry
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Mutable class registry
    pub fn classes_mut(&mut self) -> &mut ClassRegistry {
        &mut self.classes
    }

    /// Register the implementation of a recorder contract
    pub fn register_recorder<F>(&mut self, contract: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn RecorderTarget> + Send + Sync + 'static,
    {
        self.recorders
            .insert(TypeName::new(contract), Arc::new(factory));
        self
    }

    /// Register a substitution under the id the recorder assigned it
    pub fn register_substitution(
        &mut self,
        id: impl Into<String>,
        substitution: Arc<dyn ObjectSubstitution>,
    ) -> &mut Self {
        self.substitutions.insert(id.into(), substitution);
        self
    }

    /// Register a static function
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value], &StartupContext) -> ReplayResult<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Build a recorder instance wrapped as a value
    pub fn new_recorder(&self, contract: &TypeName) -> ReplayResult<Value> {
        let factory = self
            .recorders
            .get(contract)
            .ok_or_else(|| ReplayError::UnknownRecorder(contract.clone()))?;
        let handle = RecorderHandle {
            contract: contract.clone(),
            target: factory(),
        };
        Ok(Value::Native(NativeRef::new(handle)))
    }

    /// Substitution registered under `id`
    pub fn substitution(&self, id: &str) -> ReplayResult<&Arc<dyn ObjectSubstitution>> {
        self.substitutions
            .get(id)
            .ok_or_else(|| ReplayError::UnknownSubstitution(id.to_string()))
    }

    /// Static function registered under `name`
    pub fn function(&self, name: &str) -> ReplayResult<&Arc<StaticFunction>> {
        self.functions
            .get(name)
            .ok_or_else(|| ReplayError::UnknownFunction(name.to_string()))
    }

    /// Resolve a class reference by name
    pub fn class_ref(&self, name: &TypeName) -> ReplayResult<Value> {
        if PrimitiveType::from_name(name.as_str()).is_none() {
            self.classes.require(name)?;
        }
        Ok(Value::Class(name.clone()))
    }

    /// Resolve an enum constant
    pub fn enum_constant(&self, ty: &TypeName, name: &str) -> ReplayResult<Value> {
        let class = self.classes.require(ty)?;
        if !class.has_constant(name) {
            return Err(ReplayError::UnknownEnumConstant {
                ty: ty.clone(),
                name: name.to_string(),
            });
        }
        Ok(Value::enum_constant(ty.as_str(), name))
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut recorders: Vec<_> = self.recorders.keys().collect();
        recorders.sort();
        f.debug_struct("RuntimeRegistry")
            .field("classes", &self.classes.len())
            .field("recorders", &recorders)
            .field("substitutions", &self.substitutions.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}
