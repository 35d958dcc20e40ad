//! Program emission and unit splitting.
//!
//! The emitter walks the recorded instructions in order and writes their
//! steps into code units. Steps are written in groups: a group is one
//! recorder invocation, one construction, or one step of rebuilding a
//! value. Groups never straddle units. Before a group starts, every value
//! it reads is materialized; once the current unit holds the configured
//! number of groups the unit is closed with a `ChainNext` and a fresh unit
//! is opened.
//!
//! Every non-inline node is materialized exactly once, into whichever unit
//! first needs it, and written to its slot. Later reads go through the
//! slot table and are cached in a register for the rest of the unit. When
//! the last unit is closed, slots no later unit reads are dropped along
//! with their writes and the rest are renumbered densely.

use crate::error::{RecordingError, RecordingResult};
use crate::graph::{Construction, NodeId, NodeKind, NodeState, ObjectStep, ValueGraph};
use crate::registry::Registrations;
use bytecode_system::{CodeUnit, Constant, Opcode, RegisterId, SlotId};
use core_types::TypeName;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Restricted view of the current unit handed to object loaders
pub struct UnitWriter<'u> {
    unit: &'u mut CodeUnit,
    origin: Option<usize>,
}

impl<'u> UnitWriter<'u> {
    pub(crate) fn new(unit: &'u mut CodeUnit, origin: Option<usize>) -> Self {
        Self { unit, origin }
    }

    fn emit(&mut self, opcode: Opcode) {
        self.unit.emit_from(opcode, self.origin);
    }

    /// Load null
    pub fn load_null(&mut self) -> RegisterId {
        let dst = self.unit.alloc_register();
        self.emit(Opcode::LoadNull { dst });
        dst
    }

    /// Load a constant
    pub fn load_constant(&mut self, constant: Constant) -> RegisterId {
        let index = self.unit.add_constant(constant);
        let dst = self.unit.alloc_register();
        self.emit(Opcode::LoadConstant { dst, index });
        dst
    }

    /// Load a string constant
    pub fn load_string(&mut self, value: &str) -> RegisterId {
        self.load_constant(Constant::String(value.to_string()))
    }

    /// Fetch a value from the startup context
    pub fn get_context_value(&mut self, key: &str) -> RegisterId {
        let dst = self.unit.alloc_register();
        self.emit(Opcode::GetContextValue {
            dst,
            key: key.to_string(),
        });
        dst
    }

    /// Call a registered static function
    pub fn call_static(&mut self, function: &str, args: &[RegisterId]) -> RegisterId {
        let dst = self.unit.alloc_register();
        self.emit(Opcode::CallStatic {
            dst: Some(dst),
            function: function.to_string(),
            args: args.to_vec(),
        });
        dst
    }

    /// Construct through the no-arg constructor
    pub fn new_instance(&mut self, ty: &str) -> RegisterId {
        let dst = self.unit.alloc_register();
        self.emit(Opcode::NewInstance {
            dst,
            ty: TypeName::new(ty),
        });
        dst
    }

    /// Call a property mutator
    pub fn set_property(&mut self, target: RegisterId, property: &str, src: RegisterId) {
        self.emit(Opcode::SetProperty {
            target,
            property: property.to_string(),
            src,
        });
    }
}

/// An instruction whose arguments are resolved to nodes
#[derive(Debug, Clone)]
pub(crate) enum ResolvedInstruction {
    Invocation {
        recorder: NodeId,
        method: String,
        args: Vec<NodeId>,
        result_key: Option<String>,
    },
    Construction {
        ty: TypeName,
        key: String,
    },
}

/// Writes resolved instructions into chained code units
pub(crate) struct Emitter<'a> {
    graph: &'a mut ValueGraph,
    registrations: &'a Registrations,
    static_init: bool,
    program_name: String,
    max_groups: usize,
    units: Vec<CodeUnit>,
    current: CodeUnit,
    groups_in_unit: usize,
    cache: HashMap<NodeId, RegisterId>,
    origin: Option<usize>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        graph: &'a mut ValueGraph,
        registrations: &'a Registrations,
        static_init: bool,
        program_name: &str,
        max_groups: usize,
    ) -> Self {
        Self {
            graph,
            registrations,
            static_init,
            program_name: program_name.to_string(),
            max_groups: max_groups.max(1),
            units: Vec::new(),
            current: CodeUnit::new(unit_name(program_name, 0)),
            groups_in_unit: 0,
            cache: HashMap::new(),
            origin: None,
        }
    }

    /// Emit one recorded instruction
    pub(crate) fn emit_instruction(
        &mut self,
        index: usize,
        instruction: &ResolvedInstruction,
    ) -> RecordingResult<()> {
        self.origin = Some(index);
        match instruction {
            ResolvedInstruction::Invocation {
                recorder,
                method,
                args,
                result_key,
            } => {
                self.prepare(*recorder)?;
                for arg in args {
                    self.prepare(*arg)?;
                }
                self.begin_group();
                let recorder = self.load(*recorder)?;
                let mut regs = Vec::with_capacity(args.len());
                for arg in args {
                    regs.push(self.load(*arg)?);
                }
                let dst = result_key.as_ref().map(|_| self.current.alloc_register());
                self.emit(Opcode::Invoke {
                    dst,
                    recorder,
                    method: method.clone(),
                    args: regs,
                });
                if let (Some(key), Some(dst)) = (result_key, dst) {
                    self.emit(Opcode::PutContextValue {
                        key: key.clone(),
                        src: dst,
                    });
                }
            }
            ResolvedInstruction::Construction { ty, key } => {
                self.begin_group();
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewInstance {
                    dst,
                    ty: ty.clone(),
                });
                self.emit(Opcode::PutContextValue {
                    key: key.clone(),
                    src: dst,
                });
            }
        }
        Ok(())
    }

    /// Close the last unit; returns all units in chain order and the size
    /// of the compacted slot table
    pub(crate) fn finish(mut self) -> (Vec<CodeUnit>, u32) {
        self.origin = None;
        self.emit(Opcode::Return);
        self.units.push(self.current);
        let slots = compact_slots(&mut self.units);
        (self.units, slots)
    }

    fn emit(&mut self, opcode: Opcode) {
        self.current.emit_from(opcode, self.origin);
    }

    fn begin_group(&mut self) {
        if self.groups_in_unit >= self.max_groups {
            self.roll_over();
        }
        self.groups_in_unit += 1;
    }

    fn roll_over(&mut self) {
        let next = self.units.len() + 1;
        self.current.emit_from(Opcode::ChainNext(next), None);
        let finished = std::mem::replace(
            &mut self.current,
            CodeUnit::new(unit_name(&self.program_name, next)),
        );
        debug!(
            unit = %finished.name,
            steps = finished.instruction_count(),
            "code unit closed"
        );
        self.units.push(finished);
        self.groups_in_unit = 0;
        self.cache.clear();
    }

    /// Make sure a node's value is available, materializing it on first need
    fn prepare(&mut self, id: NodeId) -> RecordingResult<()> {
        let node = self.graph.node(id)?;
        if node.kind().is_inline() || node.state() == NodeState::Prepared {
            return Ok(());
        }
        let kind = node.kind().clone();
        self.graph.begin_materialize(id)?;
        trace!(node = id.index(), "materializing");
        self.materialize(id, kind)
    }

    fn materialize(&mut self, id: NodeId, kind: NodeKind) -> RecordingResult<()> {
        match kind {
            NodeKind::Loaded { loader, value } => {
                let loader = self
                    .registrations
                    .loader(loader)
                    .cloned()
                    .ok_or_else(|| {
                        RecordingError::InternalConsistency(format!("unknown loader {}", loader))
                    })?;
                self.begin_group();
                let static_init = self.static_init;
                let reg = {
                    let mut writer = UnitWriter::new(&mut self.current, self.origin);
                    loader.load(&mut writer, &value, static_init)?
                };
                self.store(id, reg)
            }
            NodeKind::Collection { shape, items } => {
                for item in &items {
                    self.prepare(*item)?;
                }
                self.begin_group();
                let args = self.load_all(&items)?;
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewCollection { dst, shape, args });
                self.store(id, dst)
            }
            NodeKind::Substituted {
                substitution,
                serialized,
            } => {
                self.prepare(serialized)?;
                self.begin_group();
                let src = self.load(serialized)?;
                let dst = self.current.alloc_register();
                self.emit(Opcode::Deserialize {
                    dst,
                    substitution,
                    src,
                });
                self.store(id, dst)
            }
            NodeKind::Optional(payload) => {
                if let Some(payload) = payload {
                    self.prepare(payload)?;
                }
                self.begin_group();
                let value = match payload {
                    Some(payload) => Some(self.load(payload)?),
                    None => None,
                };
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewOptional { dst, value });
                self.store(id, dst)
            }
            NodeKind::Array {
                component,
                elements,
            } => {
                self.begin_group();
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewArray {
                    dst,
                    component,
                    len: elements.len(),
                });
                self.store(id, dst)?;
                for (index, element) in elements.iter().enumerate() {
                    if matches!(self.graph.node(*element)?.kind(), NodeKind::Null) {
                        continue;
                    }
                    self.prepare(*element)?;
                    self.begin_group();
                    let array = self.load(id)?;
                    let src = self.load(*element)?;
                    self.emit(Opcode::ArrayStore { array, index, src });
                }
                Ok(())
            }
            NodeKind::MetadataLiteral { literal, args } => {
                for arg in &args {
                    self.prepare(*arg)?;
                }
                self.begin_group();
                let args = self.load_all(&args)?;
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewLiteral { dst, literal, args });
                self.store(id, dst)
            }
            NodeKind::Recorder { contract } => {
                self.begin_group();
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewRecorder { dst, contract });
                self.store(id, dst)
            }
            NodeKind::Object {
                construction,
                steps,
            } => {
                self.construct(id, construction)?;
                for step in &steps {
                    self.apply_step(id, step)?;
                }
                Ok(())
            }
            NodeKind::Reserved
            | NodeKind::Null
            | NodeKind::Constant(_)
            | NodeKind::Enum { .. }
            | NodeKind::Class(_)
            | NodeKind::ContextValue { .. } => Err(RecordingError::InternalConsistency(format!(
                "node {} cannot be materialized",
                id.index()
            ))),
        }
    }

    fn construct(&mut self, id: NodeId, construction: Construction) -> RecordingResult<()> {
        match construction {
            Construction::Default { ty } => {
                self.begin_group();
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewInstance { dst, ty });
                self.store(id, dst)
            }
            Construction::WithArgs { ty, params, args } => {
                for arg in &args {
                    self.prepare(*arg)?;
                }
                self.begin_group();
                let args = self.load_all(&args)?;
                let dst = self.current.alloc_register();
                self.emit(Opcode::NewInstanceWith {
                    dst,
                    ty,
                    params,
                    args,
                });
                self.store(id, dst)
            }
        }
    }

    fn apply_step(&mut self, id: NodeId, step: &ObjectStep) -> RecordingResult<()> {
        for input in step.inputs() {
            self.prepare(input)?;
        }
        self.begin_group();
        let target = self.load(id)?;
        match step {
            ObjectStep::Append(item) => {
                let src = self.load(*item)?;
                self.emit(Opcode::Append { target, src });
            }
            ObjectStep::Put(key, value) => {
                let key = self.load(*key)?;
                let value = self.load(*value)?;
                self.emit(Opcode::Put { target, key, value });
            }
            ObjectStep::AppendToProperty { property, item } => {
                let held = self.current.alloc_register();
                self.emit(Opcode::GetProperty {
                    dst: held,
                    target,
                    property: property.clone(),
                });
                let src = self.load(*item)?;
                self.emit(Opcode::Append { target: held, src });
            }
            ObjectStep::PutIntoProperty {
                property,
                key,
                value,
            } => {
                let held = self.current.alloc_register();
                self.emit(Opcode::GetProperty {
                    dst: held,
                    target,
                    property: property.clone(),
                });
                let key = self.load(*key)?;
                let value = self.load(*value)?;
                self.emit(Opcode::Put {
                    target: held,
                    key,
                    value,
                });
            }
            ObjectStep::SetProperty { property, value } => {
                let src = self.load(*value)?;
                self.emit(Opcode::SetProperty {
                    target,
                    property: property.clone(),
                    src,
                });
            }
            ObjectStep::WriteField { field, value } => {
                let src = self.load(*value)?;
                self.emit(Opcode::WriteField {
                    target,
                    field: field.clone(),
                    src,
                });
            }
        }
        Ok(())
    }

    /// Write a freshly built value to its slot and mark the node prepared
    fn store(&mut self, id: NodeId, src: RegisterId) -> RecordingResult<()> {
        let slot = self.graph.node(id)?.slot().ok_or_else(|| {
            RecordingError::InternalConsistency(format!("node {} has no slot", id.index()))
        })?;
        self.emit(Opcode::WriteSlot { slot, src });
        self.cache.insert(id, src);
        self.graph.finish_materialize(id)
    }

    fn load_all(&mut self, ids: &[NodeId]) -> RecordingResult<Vec<RegisterId>> {
        ids.iter().map(|id| self.load(*id)).collect()
    }

    /// Bring a node's value into a register of the current unit
    fn load(&mut self, id: NodeId) -> RecordingResult<RegisterId> {
        if let Some(reg) = self.cache.get(&id) {
            return Ok(*reg);
        }
        let dst = self.current.alloc_register();
        let node = self.graph.node(id)?;
        let opcode = match node.kind() {
            NodeKind::Null => Opcode::LoadNull { dst },
            NodeKind::Constant(constant) => Opcode::LoadConstant {
                dst,
                index: self.current.add_constant(constant.clone()),
            },
            NodeKind::Enum { ty, name } => Opcode::LoadEnum {
                dst,
                ty: ty.clone(),
                name: name.clone(),
            },
            NodeKind::Class(name) => Opcode::LoadClass {
                dst,
                name: name.clone(),
            },
            NodeKind::ContextValue { key } => Opcode::GetContextValue {
                dst,
                key: key.clone(),
            },
            _ => {
                if node.state() != NodeState::Prepared {
                    return Err(RecordingError::InternalConsistency(format!(
                        "node {} read before it was materialized",
                        id.index()
                    )));
                }
                let slot = node.slot().ok_or_else(|| {
                    RecordingError::InternalConsistency(format!("node {} has no slot", id.index()))
                })?;
                Opcode::ReadSlot { dst, slot }
            }
        };
        self.emit(opcode);
        self.cache.insert(id, dst);
        Ok(dst)
    }
}

fn unit_name(program: &str, index: usize) -> String {
    format!("{}_{}", program, index)
}

/// Remove writes to slots that are never read and renumber the rest in
/// first-write order. Reads within the writing unit go through registers,
/// so only values crossing a unit boundary keep a slot.
fn compact_slots(units: &mut [CodeUnit]) -> u32 {
    let read: HashSet<SlotId> = units
        .iter()
        .flat_map(|unit| &unit.instructions)
        .filter_map(|inst| match inst.opcode {
            Opcode::ReadSlot { slot, .. } => Some(slot),
            _ => None,
        })
        .collect();
    let mut renumbered: HashMap<SlotId, SlotId> = HashMap::new();
    for unit in units.iter_mut() {
        unit.instructions
            .retain(|inst| !matches!(inst.opcode, Opcode::WriteSlot { slot, .. } if !read.contains(&slot)));
        for inst in &mut unit.instructions {
            match &mut inst.opcode {
                Opcode::WriteSlot { slot, .. } => {
                    let next = SlotId(renumbered.len() as u32);
                    *slot = *renumbered.entry(*slot).or_insert(next);
                }
                Opcode::ReadSlot { slot, .. } => {
                    if let Some(mapped) = renumbered.get(slot) {
                        *slot = *mapped;
                    }
                }
                _ => {}
            }
        }
    }
    renumbered.len() as u32
}
