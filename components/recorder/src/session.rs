//! Recording sessions.
//!
//! A session records the calls of one build step into one startup program.
//! Recording happens on a single logical thread; the recorded order is the
//! replay order. [`RecordingSession::finish`] resolves every argument into
//! the value graph, seals it and emits the chained code units.

use crate::config::RecorderConfig;
use crate::contract::RecorderContract;
use crate::emit::{Emitter, ResolvedInstruction};
use crate::error::{RecordingError, RecordingResult};
use crate::graph::ValueGraph;
use crate::instruction::RecordedInstruction;
use crate::proxy::{KeyGenerator, ProxyTypeCache, RecordingProxy, SessionLog};
use crate::registry::{NonDefaultConstructor, ObjectLoader, Registrations, SubstitutionHolder};
use crate::resolve::Resolver;
use bytecode_system::{ProgramOutput, StartupProgram};
use core_types::{
    ClassRegistry, ConstructorDescriptor, LiteralType, ObjectSubstitution, Placeholder, TypeName,
    TypeRef, Value,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Records one build step's recorder calls
pub struct RecordingSession {
    name: String,
    static_init: bool,
    config: RecorderConfig,
    classes: Arc<ClassRegistry>,
    proxy_types: Arc<ProxyTypeCache>,
    keys: Arc<KeyGenerator>,
    log: Arc<Mutex<SessionLog>>,
    proxies: HashMap<TypeName, Arc<RecordingProxy>>,
    registrations: Registrations,
}

impl RecordingSession {
    pub(crate) fn new(
        name: String,
        static_init: bool,
        config: RecorderConfig,
        classes: Arc<ClassRegistry>,
        proxy_types: Arc<ProxyTypeCache>,
        keys: Arc<KeyGenerator>,
    ) -> Self {
        debug!(program = %name, static_init, "recording session opened");
        Self {
            name,
            static_init,
            config,
            classes,
            proxy_types,
            keys,
            log: Arc::new(Mutex::new(SessionLog::new(static_init))),
            proxies: HashMap::new(),
            registrations: Registrations::default(),
        }
    }

    /// Name of the program this session emits
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the program runs during static init
    pub fn is_static_init(&self) -> bool {
        self.static_init
    }

    /// The recording proxy for `contract`, one per contract per session
    pub fn recording_proxy(&mut self, contract: &Arc<RecorderContract>) -> Arc<RecordingProxy> {
        if let Some(proxy) = self.proxies.get(contract.name()) {
            return proxy.clone();
        }
        let plan = self.proxy_types.plan_for(contract, &self.classes);
        let proxy = Arc::new(RecordingProxy::new(
            contract.clone(),
            plan,
            self.log.clone(),
            self.keys.clone(),
        ));
        self.proxies.insert(contract.name().clone(), proxy.clone());
        proxy
    }

    /// Rebuild values of type `from` from a stand-in of type `to`.
    ///
    /// The replay side finds the substitution under the name of `from`.
    pub fn register_substitution(
        &mut self,
        from: impl Into<String>,
        to: TypeRef,
        substitution: Arc<dyn ObjectSubstitution>,
    ) {
        let from = TypeName::new(from);
        self.registrations.add_substitution(SubstitutionHolder {
            id: from.as_str().to_string(),
            from,
            to,
            substitution,
        });
    }

    /// Construct `ty` through `constructor`, with arguments taken from the
    /// instance by `arguments`
    pub fn register_non_default_constructor<F>(
        &mut self,
        ty: impl Into<String>,
        constructor: ConstructorDescriptor,
        arguments: F,
    ) where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        self.registrations.add_constructor(
            TypeName::new(ty),
            NonDefaultConstructor {
                constructor,
                arguments: Arc::new(arguments),
            },
        );
    }

    /// Let `loader` take over the values it claims
    pub fn register_object_loader(&mut self, loader: Arc<dyn ObjectLoader>) {
        self.registrations.add_loader(loader);
    }

    /// A reference to a class that is only resolvable at replay time
    pub fn class_proxy(&mut self, name: impl Into<String>) -> Value {
        let name = TypeName::new(name);
        self.registrations.add_class_proxy(name.clone());
        Value::Class(name)
    }

    /// Record a no-arg construction of `ty`; the instance is published under
    /// the returned placeholder
    pub fn new_instance(&mut self, ty: impl Into<String>) -> RecordingResult<Value> {
        let ty = TypeName::new(ty);
        let class = self.classes.require(&ty)?;
        if !class.has_default_constructor() || class.is_interface() {
            return Err(RecordingError::NoDefaultConstructor(ty));
        }
        let mut log = self.log.lock();
        let placeholder = Placeholder::new(
            self.keys.next_key(),
            self.static_init,
            TypeRef::Named(ty.clone()),
        );
        log.push(RecordedInstruction::Construction {
            ty,
            result: placeholder.clone(),
        })?;
        Ok(Value::Placeholder(placeholder))
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.log.lock().instructions().is_empty()
    }

    /// Number of recorded instructions
    pub fn instruction_count(&self) -> usize {
        self.log.lock().instructions().len()
    }

    /// End recording and emit the program.
    ///
    /// Recording through this session's proxies fails afterwards. Any
    /// error leaves nothing published.
    pub fn finish(&mut self) -> RecordingResult<StartupProgram> {
        let instructions = self.log.lock().finish()?;
        let mut graph = ValueGraph::new();
        let mut literal_types: Vec<Arc<LiteralType>> = Vec::new();

        let resolved = {
            let mut resolver = Resolver {
                graph: &mut graph,
                classes: &self.classes,
                registrations: &self.registrations,
                static_init: self.static_init,
                literal_types: &mut literal_types,
            };
            instructions
                .iter()
                .map(|instruction| resolve_instruction(&mut resolver, instruction))
                .collect::<RecordingResult<Vec<_>>>()?
        };

        graph.seal()?;
        let mut emitter = Emitter::new(
            &mut graph,
            &self.registrations,
            self.static_init,
            &self.name,
            self.config.max_steps_per_unit,
        );
        for (index, instruction) in resolved.iter().enumerate() {
            emitter.emit_instruction(index, instruction)?;
        }

        let mut program = StartupProgram::new(self.name.clone(), self.static_init);
        let (units, slot_count) = emitter.finish();
        program.slot_count = slot_count;
        program.units = units;
        program.literal_types = literal_types.iter().map(|t| (**t).clone()).collect();
        program.validate()?;

        info!(
            program = %program.name,
            instructions = instructions.len(),
            nodes = graph.len(),
            slots = slot_count,
            units = program.units.len(),
            "startup program emitted"
        );
        Ok(program)
    }

    /// Finish and hand the program to `output`
    pub fn write_program(&mut self, output: &mut dyn ProgramOutput) -> RecordingResult<StartupProgram> {
        let program = self.finish()?;
        output.write_program(&program)?;
        Ok(program)
    }
}

fn resolve_instruction(
    resolver: &mut Resolver<'_>,
    instruction: &RecordedInstruction,
) -> RecordingResult<ResolvedInstruction> {
    match instruction {
        RecordedInstruction::Invocation {
            contract,
            method,
            args,
            result,
        } => {
            let recorder = resolver.graph.recorder(contract.name())?;
            let mut nodes = Vec::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&method.params) {
                nodes.push(resolver.resolve(arg, param)?);
            }
            Ok(ResolvedInstruction::Invocation {
                recorder,
                method: method.name.clone(),
                args: nodes,
                result_key: result.as_ref().map(|p| p.key().to_string()),
            })
        }
        RecordedInstruction::Construction { ty, result } => Ok(ResolvedInstruction::Construction {
            ty: ty.clone(),
            key: result.key().to_string(),
        }),
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("name", &self.name)
            .field("static_init", &self.static_init)
            .field("registrations", &self.registrations)
            .finish()
    }
}
