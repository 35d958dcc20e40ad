//! Recording proxies.
//!
//! A [`RecordingProxy`] stands in for a recorder while a build step runs.
//! Each call is checked against the contract and appended to the session
//! log instead of being executed. Calls with a result hand back a
//! [`Placeholder`] whose value is only known once the program replays.

use crate::contract::{RecorderContract, ReturnType};
use crate::error::{RecordingError, RecordingResult};
use crate::instruction::RecordedInstruction;
use core_types::{ClassKind, ClassRegistry, Placeholder, TypeName, TypeRef, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// How calls to one method are recorded
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPlan {
    /// Nothing is returned
    Void,
    /// A placeholder of the given type is returned
    Placeholder(TypeRef),
    /// The declared result type cannot be proxied
    Unsupported(TypeRef),
}

/// Per-method result handling for one contract, computed once
#[derive(Debug)]
pub struct ProxyPlan {
    contract: TypeName,
    methods: Vec<(String, usize, ResultPlan)>,
}

impl ProxyPlan {
    fn build(contract: &RecorderContract, classes: &ClassRegistry) -> Self {
        let methods = contract
            .methods()
            .iter()
            .map(|m| {
                let plan = match &m.returns {
                    ReturnType::Void => ResultPlan::Void,
                    ReturnType::Value(ty) if is_proxiable(ty, classes) => {
                        ResultPlan::Placeholder(ty.clone())
                    }
                    ReturnType::Value(ty) => ResultPlan::Unsupported(ty.clone()),
                };
                (m.name.clone(), m.arity(), plan)
            })
            .collect();
        Self {
            contract: contract.name().clone(),
            methods,
        }
    }

    /// Contract the plan was computed for
    pub fn contract(&self) -> &TypeName {
        &self.contract
    }

    /// Result handling of a method
    pub fn result_plan(&self, method: &str, arity: usize) -> Option<&ResultPlan> {
        self.methods
            .iter()
            .find(|(name, n, _)| name == method && *n == arity)
            .map(|(_, _, plan)| plan)
    }
}

/// Whether a placeholder may stand in for a result of type `ty`.
///
/// Interfaces qualify, as do non-final bean and container classes with a
/// no-arg constructor. Primitives, arrays and unknown types do not.
pub fn is_proxiable(ty: &TypeRef, classes: &ClassRegistry) -> bool {
    match ty {
        TypeRef::Any => true,
        TypeRef::Primitive(_) | TypeRef::Array(_) => false,
        TypeRef::Named(name) => match classes.get(name.as_str()) {
            Some(class) if class.is_interface() => true,
            Some(class) => {
                !class.is_final()
                    && class.has_default_constructor()
                    && matches!(
                        class.kind(),
                        ClassKind::Bean | ClassKind::List | ClassKind::Set | ClassKind::Map
                    )
            }
            None => false,
        },
    }
}

/// Process-wide cache of proxy plans keyed by contract name
#[derive(Debug, Default)]
pub struct ProxyTypeCache {
    plans: RwLock<HashMap<TypeName, Arc<ProxyPlan>>>,
}

impl ProxyTypeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The plan for `contract`, computed on first request
    pub fn plan_for(&self, contract: &RecorderContract, classes: &ClassRegistry) -> Arc<ProxyPlan> {
        if let Some(plan) = self.plans.read().get(contract.name()) {
            return plan.clone();
        }
        self.plans
            .write()
            .entry(contract.name().clone())
            .or_insert_with(|| {
                debug!(contract = %contract.name(), "building proxy plan");
                Arc::new(ProxyPlan::build(contract, classes))
            })
            .clone()
    }

    /// Number of cached plans
    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    /// Whether no plan is cached
    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }

    /// Drop all cached plans
    pub fn clear(&self) {
        self.plans.write().clear();
    }
}

/// Instructions recorded by one session
#[derive(Debug)]
pub struct SessionLog {
    static_init: bool,
    instructions: Vec<RecordedInstruction>,
    finished: bool,
}

impl SessionLog {
    pub(crate) fn new(static_init: bool) -> Self {
        Self {
            static_init,
            instructions: Vec::new(),
            finished: false,
        }
    }

    /// Whether the session records for the static-init phase
    pub fn is_static_init(&self) -> bool {
        self.static_init
    }

    /// Recorded instructions, in order
    pub fn instructions(&self) -> &[RecordedInstruction] {
        &self.instructions
    }

    /// Whether the session has been finished
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn push(&mut self, instruction: RecordedInstruction) -> RecordingResult<()> {
        if self.finished {
            return Err(RecordingError::AlreadyFinalized);
        }
        trace!(instruction = %instruction.describe(), "recorded");
        self.instructions.push(instruction);
        Ok(())
    }

    pub(crate) fn finish(&mut self) -> RecordingResult<Vec<RecordedInstruction>> {
        if self.finished {
            return Err(RecordingError::AlreadyFinalized);
        }
        self.finished = true;
        Ok(std::mem::take(&mut self.instructions))
    }
}

/// Generator of placeholder keys shared by all sessions of an environment
#[derive(Debug, Default)]
pub struct KeyGenerator {
    next: AtomicUsize,
}

impl KeyGenerator {
    /// Next unused key
    pub fn next_key(&self) -> String {
        format!("proxykey{}", self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Interceptor that records calls on a recorder contract
#[derive(Debug)]
pub struct RecordingProxy {
    contract: Arc<RecorderContract>,
    plan: Arc<ProxyPlan>,
    log: Arc<Mutex<SessionLog>>,
    keys: Arc<KeyGenerator>,
}

impl RecordingProxy {
    pub(crate) fn new(
        contract: Arc<RecorderContract>,
        plan: Arc<ProxyPlan>,
        log: Arc<Mutex<SessionLog>>,
        keys: Arc<KeyGenerator>,
    ) -> Self {
        Self {
            contract,
            plan,
            log,
            keys,
        }
    }

    /// The contract being recorded
    pub fn contract(&self) -> &Arc<RecorderContract> {
        &self.contract
    }

    /// Record a call.
    ///
    /// Void methods return `None`. Methods with a proxiable result return a
    /// placeholder that may only be passed back into recorders. A method
    /// whose result cannot be proxied fails and records nothing.
    pub fn call(&self, method: &str, args: Vec<Value>) -> RecordingResult<Option<Value>> {
        let signature = self
            .contract
            .find(method, args.len())
            .ok_or_else(|| RecordingError::UnknownMethod {
                contract: self.contract.name().clone(),
                method: method.to_string(),
                arity: args.len(),
            })?
            .clone();
        let plan = self
            .plan
            .result_plan(method, args.len())
            .cloned()
            .unwrap_or(ResultPlan::Void);

        let mut log = self.log.lock();
        let (result, returned) = match plan {
            ResultPlan::Void => (None, None),
            ResultPlan::Unsupported(ty) => {
                return Err(RecordingError::UnsupportedResultType {
                    contract: self.contract.name().clone(),
                    method: method.to_string(),
                    ty,
                })
            }
            ResultPlan::Placeholder(ty) => {
                let placeholder = Placeholder::new(self.keys.next_key(), log.is_static_init(), ty);
                (
                    Some(placeholder.clone()),
                    Some(Value::Placeholder(placeholder)),
                )
            }
        };
        log.push(RecordedInstruction::Invocation {
            contract: self.contract.clone(),
            method: signature,
            args,
            result,
        })?;
        Ok(returned)
    }
}
