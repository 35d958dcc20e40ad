//! Per-session registrations that steer value decomposition.

use crate::emit::UnitWriter;
use crate::error::RecordingResult;
use bytecode_system::RegisterId;
use core_types::{ConstructorDescriptor, ObjectSubstitution, TypeName, TypeRef, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A substitution registered for one type
#[derive(Clone)]
pub struct SubstitutionHolder {
    /// Id the replay side looks the substitution up by
    pub id: String,
    /// Type being substituted
    pub from: TypeName,
    /// Declared type of the serialized stand-in
    pub to: TypeRef,
    /// The conversion
    pub substitution: Arc<dyn ObjectSubstitution>,
}

impl fmt::Debug for SubstitutionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutionHolder")
            .field("id", &self.id)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// Function producing constructor arguments from an instance
pub type ArgumentsFn = dyn Fn(&Value) -> Vec<Value> + Send + Sync;

/// A constructor to use instead of the no-arg one
#[derive(Clone)]
pub struct NonDefaultConstructor {
    /// Constructor to call
    pub constructor: ConstructorDescriptor,
    /// Produces the arguments for a given instance
    pub arguments: Arc<ArgumentsFn>,
}

impl fmt::Debug for NonDefaultConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonDefaultConstructor")
            .field("constructor", &self.constructor)
            .finish()
    }
}

/// Resolver that takes over values before any built-in rule.
///
/// A loader claims a value through [`ObjectLoader::can_handle`] and then
/// emits its own steps to produce it.
pub trait ObjectLoader: Send + Sync {
    /// Whether this loader produces `value`
    fn can_handle(&self, value: &Value, static_init: bool) -> bool;

    /// Emit the steps producing `value`, returning the register holding it
    fn load(
        &self,
        writer: &mut UnitWriter<'_>,
        value: &Value,
        static_init: bool,
    ) -> RecordingResult<RegisterId>;
}

/// Everything registered on one session
#[derive(Default)]
pub struct Registrations {
    substitutions: HashMap<TypeName, SubstitutionHolder>,
    constructors: HashMap<TypeName, NonDefaultConstructor>,
    loaders: Vec<Arc<dyn ObjectLoader>>,
    class_proxies: HashSet<TypeName>,
}

impl Registrations {
    /// Register a substitution for `from`
    pub fn add_substitution(&mut self, holder: SubstitutionHolder) {
        self.substitutions.insert(holder.from.clone(), holder);
    }

    /// Register a non-default constructor for `ty`
    pub fn add_constructor(&mut self, ty: TypeName, constructor: NonDefaultConstructor) {
        self.constructors.insert(ty, constructor);
    }

    /// Register an object loader; loaders are consulted in registration order
    pub fn add_loader(&mut self, loader: Arc<dyn ObjectLoader>) {
        self.loaders.push(loader);
    }

    /// Register a class name that resolves only at replay time
    pub fn add_class_proxy(&mut self, name: TypeName) {
        self.class_proxies.insert(name);
    }

    /// Substitution for the value's type, else for the declared type
    pub fn substitution_for(
        &self,
        value_type: Option<&TypeName>,
        expected: &TypeRef,
    ) -> Option<&SubstitutionHolder> {
        value_type
            .and_then(|ty| self.substitutions.get(ty))
            .or_else(|| expected.type_name().and_then(|ty| self.substitutions.get(ty)))
    }

    /// Non-default constructor registered for `ty`
    pub fn constructor_for(&self, ty: &TypeName) -> Option<&NonDefaultConstructor> {
        self.constructors.get(ty)
    }

    /// Index of the first loader claiming `value`
    pub fn loader_for(&self, value: &Value, static_init: bool) -> Option<usize> {
        self.loaders
            .iter()
            .position(|l| l.can_handle(value, static_init))
    }

    /// Loader by index
    pub fn loader(&self, index: usize) -> Option<&Arc<dyn ObjectLoader>> {
        self.loaders.get(index)
    }

    /// Whether `name` was registered as a class proxy
    pub fn is_class_proxy(&self, name: &TypeName) -> bool {
        self.class_proxies.contains(name)
    }
}

impl fmt::Debug for Registrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrations")
            .field("substitutions", &self.substitutions.len())
            .field("constructors", &self.constructors.len())
            .field("loaders", &self.loaders.len())
            .field("class_proxies", &self.class_proxies)
            .finish()
    }
}
