//! Step dispatch.
//!
//! Executes the steps of one code unit against the slot table, the
//! startup context and the runtime registry.

use bytecode_system::{Opcode, ProgramError, StartupProgram};
use core_types::{
    ArrayRef, ClassKind, LiteralType, MetadataLiteral, ObjectRef, TypeName, Value,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::context::{StartupContext, UnitFrame};
use crate::error::{ReplayError, ReplayResult};
use crate::registry::{RecorderHandle, RuntimeRegistry};
use crate::slots::SlotTable;
use crate::vm::ReplayStats;

/// Where control goes after a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Continue with the unit at this index
    Next(usize),
    /// The program is done
    Return,
}

/// Executes the units of one program
pub struct Dispatcher<'a> {
    program: &'a StartupProgram,
    registry: &'a RuntimeRegistry,
    context: &'a StartupContext,
    slots: SlotTable,
    literals: HashMap<TypeName, Arc<LiteralType>>,
    stats: ReplayStats,
}

impl<'a> Dispatcher<'a> {
    /// Prepare to execute `program`
    pub fn new(
        program: &'a StartupProgram,
        registry: &'a RuntimeRegistry,
        context: &'a StartupContext,
    ) -> Self {
        let literals = program
            .literal_types
            .iter()
            .map(|t| (t.name.clone(), Arc::new(t.clone())))
            .collect();
        Self {
            program,
            registry,
            context,
            slots: SlotTable::new(program.slot_count as usize),
            literals,
            stats: ReplayStats::default(),
        }
    }

    /// Counters collected so far
    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    /// The slot table
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Execute the unit at `index`
    pub fn execute_unit(&mut self, index: usize) -> ReplayResult<Flow> {
        let program = self.program;
        let unit = program
            .units
            .get(index)
            .ok_or_else(|| self.malformed(index, "unit does not exist"))?;
        debug!(unit = %unit.name, steps = unit.instructions.len(), "executing unit");
        self.stats.units += 1;

        let mut frame = UnitFrame::new(unit);
        while let Some(instruction) = frame.fetch() {
            self.stats.steps += 1;
            trace!(op = %instruction.opcode, "step");
            if let Some(flow) = self.step(&mut frame, &instruction.opcode)? {
                return Ok(flow);
            }
        }
        Err(self.malformed(index, "unit ends without a terminator"))
    }

    fn malformed(&self, unit: usize, reason: &str) -> ReplayError {
        ProgramError::Malformed {
            program: self.program.name.clone(),
            unit,
            reason: reason.to_string(),
        }
        .into()
    }

    fn step(&mut self, frame: &mut UnitFrame<'_>, opcode: &Opcode) -> ReplayResult<Option<Flow>> {
        match opcode {
            Opcode::LoadNull { dst } => frame.set(*dst, Value::Null),
            Opcode::LoadConstant { dst, index } => {
                let constant = frame.unit().constants.get(*index).ok_or_else(|| {
                    ReplayError::UnknownConstant {
                        unit: frame.unit().name.clone(),
                        index: *index,
                    }
                })?;
                frame.set(*dst, constant.to_value());
            }
            Opcode::LoadEnum { dst, ty, name } => {
                frame.set(*dst, self.registry.enum_constant(ty, name)?);
            }
            Opcode::LoadClass { dst, name } => frame.set(*dst, self.registry.class_ref(name)?),
            Opcode::ReadSlot { dst, slot } => frame.set(*dst, self.slots.read(*slot)?),
            Opcode::WriteSlot { slot, src } => self.slots.write(*slot, frame.get(*src)?)?,
            Opcode::GetContextValue { dst, key } => {
                let value = self
                    .context
                    .get(key)
                    .ok_or_else(|| ReplayError::MissingContextValue(key.clone()))?;
                frame.set(*dst, value);
            }
            Opcode::PutContextValue { key, src } => self.context.put(key.clone(), frame.get(*src)?),
            Opcode::NewInstance { dst, ty } => {
                let object = self.registry.classes().require(ty)?.instantiate()?;
                frame.set(*dst, Value::Object(object));
            }
            Opcode::NewInstanceWith {
                dst,
                ty,
                params,
                args,
            } => {
                let args = frame.get_all(args)?;
                let object = self
                    .registry
                    .classes()
                    .require(ty)?
                    .instantiate_with(params, args)?;
                frame.set(*dst, Value::Object(object));
            }
            Opcode::NewCollection { dst, shape, args } => {
                let class = self
                    .registry
                    .classes()
                    .require(&TypeName::new(shape.class_name()))?
                    .clone();
                let mut items = frame.get_all(args)?;
                let object = match class.kind() {
                    ClassKind::Map => {
                        let mut entries = Vec::with_capacity(items.len() / 2);
                        while items.len() >= 2 {
                            let value = items.remove(1);
                            let key = items.remove(0);
                            entries.push((key, value));
                        }
                        ObjectRef::map(class, entries)
                    }
                    ClassKind::Set => ObjectRef::set(class, items),
                    _ => ObjectRef::list(class, items),
                };
                frame.set(*dst, Value::Object(object));
            }
            Opcode::NewOptional { dst, value } => {
                let value = match value {
                    Some(src) => Value::some(frame.get(*src)?),
                    None => Value::none(),
                };
                frame.set(*dst, value);
            }
            Opcode::NewArray {
                dst,
                component,
                len,
            } => frame.set(
                *dst,
                Value::Array(ArrayRef::allocate(component.clone(), *len)),
            ),
            Opcode::ArrayStore { array, index, src } => {
                let array = frame.get(*array)?;
                let array = array.as_array().ok_or_else(|| mismatch("ArrayStore", "an array", &array))?;
                array.set(*index, frame.get(*src)?)?;
            }
            Opcode::NewLiteral { dst, literal, args } => {
                let literal_type = self
                    .literals
                    .get(literal)
                    .ok_or_else(|| ReplayError::UnknownLiteralType(literal.clone()))?
                    .clone();
                let literal = MetadataLiteral::new(literal_type, frame.get_all(args)?)?;
                frame.set(*dst, Value::Metadata(Arc::new(literal)));
            }
            Opcode::Deserialize {
                dst,
                substitution,
                src,
            } => {
                let value = self
                    .registry
                    .substitution(substitution)?
                    .deserialize(frame.get(*src)?)?;
                frame.set(*dst, value);
            }
            Opcode::NewRecorder { dst, contract } => {
                debug!(contract = %contract, "constructing recorder");
                self.stats.recorders += 1;
                frame.set(*dst, self.registry.new_recorder(contract)?);
            }
            Opcode::CallStatic {
                dst,
                function,
                args,
            } => {
                let function = self.registry.function(function)?.clone();
                let result = function(&frame.get_all(args)?, self.context)?;
                if let Some(dst) = dst {
                    frame.set(*dst, result);
                }
            }
            Opcode::Append { target, src } => {
                object(frame.get(*target)?, "Append")?.add(frame.get(*src)?)?;
            }
            Opcode::Put { target, key, value } => {
                object(frame.get(*target)?, "Put")?.put(frame.get(*key)?, frame.get(*value)?)?;
            }
            Opcode::GetProperty {
                dst,
                target,
                property,
            } => {
                let value = object(frame.get(*target)?, "GetProperty")?.get_property(property)?;
                frame.set(*dst, value);
            }
            Opcode::SetProperty {
                target,
                property,
                src,
            } => {
                object(frame.get(*target)?, "SetProperty")?.set_property(property, frame.get(*src)?)?;
            }
            Opcode::WriteField { target, field, src } => {
                object(frame.get(*target)?, "WriteField")?.set_field(field, frame.get(*src)?)?;
            }
            Opcode::Invoke {
                dst,
                recorder,
                method,
                args,
            } => {
                let value = frame.get(*recorder)?;
                let handle = RecorderHandle::from_value(&value)
                    .ok_or_else(|| mismatch("Invoke", "a recorder", &value))?;
                let result = handle
                    .target()
                    .invoke(method, frame.get_all(args)?, self.context)?;
                self.stats.invocations += 1;
                if let Some(dst) = dst {
                    let result = result.ok_or_else(|| ReplayError::MissingResult {
                        recorder: handle.contract().clone(),
                        method: method.clone(),
                    })?;
                    frame.set(*dst, result);
                }
            }
            Opcode::ChainNext(next) => return Ok(Some(Flow::Next(*next))),
            Opcode::Return => return Ok(Some(Flow::Return)),
        }
        Ok(None)
    }
}

fn object(value: Value, step: &'static str) -> ReplayResult<ObjectRef> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(mismatch(step, "an object", &other)),
    }
}

fn mismatch(step: &'static str, expected: &'static str, found: &Value) -> ReplayError {
    ReplayError::TypeMismatch {
        step,
        expected,
        found: found.kind_name(),
    }
}
