//! General object decomposition.
//!
//! An object is rebuilt by constructing an instance and replaying steps on
//! it: appends and puts for containers, mutator calls for read-write
//! properties, appends and puts into the containers held by read-only
//! properties, and writes of public mutable fields.

use crate::error::{RecordingError, RecordingResult};
use crate::graph::{Construction, NodeId, NodeKind, ObjectStep};
use crate::resolve::Resolver;
use core_types::{well_known, IdentityKey, ObjectRef, ObjectState, TypeName, TypeRef, Value};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Collection,
    Map,
}

impl<'a> Resolver<'a> {
    pub(crate) fn decompose(
        &mut self,
        key: IdentityKey,
        object: &ObjectRef,
        expected: &TypeRef,
    ) -> RecordingResult<NodeId> {
        let id = self.graph.reserve(Some(key))?;
        let construction = self.construction(object, expected)?;
        trace!(ty = %object.type_name(), constructs = %construction.type_name(), "decomposing object");

        let mut steps = Vec::new();
        match object.snapshot() {
            ObjectState::List(items) | ObjectState::Set(items) => {
                for item in &items {
                    steps.push(ObjectStep::Append(self.resolve(item, &TypeRef::Any)?));
                }
            }
            ObjectState::Map(entries) => {
                for (k, v) in &entries {
                    let k = self.resolve(k, &TypeRef::Any)?;
                    let v = self.resolve(v, &TypeRef::Any)?;
                    steps.push(ObjectStep::Put(k, v));
                }
            }
            ObjectState::Bean(_) => self.bean_steps(object, &mut steps)?,
        }

        self.graph.fill(
            id,
            NodeKind::Object {
                construction,
                steps,
            },
        )?;
        Ok(id)
    }

    fn construction(&mut self, object: &ObjectRef, expected: &TypeRef) -> RecordingResult<Construction> {
        let class = object.class().clone();
        let ty = class.name().clone();

        if let Some(ctor) = self.registrations.constructor_for(&ty) {
            let args = (ctor.arguments)(&Value::Object(object.clone()));
            if args.len() != ctor.constructor.arity() {
                return Err(RecordingError::ArgumentCountMismatch {
                    ty,
                    expected: ctor.constructor.arity(),
                    actual: args.len(),
                });
            }
            let params = ctor.constructor.param_types();
            let mut nodes = Vec::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&params) {
                self.graph.retain(arg);
                nodes.push(self.resolve(arg, param)?);
            }
            return Ok(Construction::WithArgs {
                ty,
                params,
                args: nodes,
            });
        }

        if class.has_default_constructor() && !class.is_interface() {
            return Ok(Construction::Default { ty });
        }

        let fallback = if class.is_collection() && expected.is_list_like() {
            Some(well_known::ARRAY_LIST)
        } else if class.is_collection() && expected.is_set_like() {
            Some(well_known::LINKED_HASH_SET)
        } else if class.is_map() && expected.is_map_like() {
            Some(well_known::LINKED_HASH_MAP)
        } else {
            None
        };
        match fallback {
            Some(name) => Ok(Construction::Default {
                ty: TypeName::new(name),
            }),
            None => Err(RecordingError::NoDefaultConstructor(ty)),
        }
    }

    fn bean_steps(&mut self, object: &ObjectRef, steps: &mut Vec<ObjectStep>) -> RecordingResult<()> {
        let class = object.class().clone();
        let mut handled = HashSet::new();

        for property in class.properties() {
            let current = object.get_property(&property.name)?;
            if property.is_read_only() {
                let container = match self.container_of(&property.ty) {
                    Some(container) => container,
                    None => continue,
                };
                handled.insert(property.name.as_str());
                // A null or empty container needs nothing beyond the default instance.
                let held = match current.as_object() {
                    Some(held) if !held.is_empty() => held.clone(),
                    _ => continue,
                };
                match container {
                    Container::Collection => {
                        for item in held.elements()? {
                            let item = self.resolve(&item, &TypeRef::Any)?;
                            steps.push(ObjectStep::AppendToProperty {
                                property: property.name.clone(),
                                item,
                            });
                        }
                    }
                    Container::Map => {
                        for (k, v) in held.entries()? {
                            let key = self.resolve(&k, &TypeRef::Any)?;
                            let value = self.resolve(&v, &TypeRef::Any)?;
                            steps.push(ObjectStep::PutIntoProperty {
                                property: property.name.clone(),
                                key,
                                value,
                            });
                        }
                    }
                }
            } else {
                handled.insert(property.name.as_str());
                if current.is_null() {
                    continue;
                }
                let value = self.resolve(&current, &property.ty)?;
                steps.push(ObjectStep::SetProperty {
                    property: property.name.clone(),
                    value,
                });
            }
        }

        for field in class.fields() {
            if !field.is_public_mutable() || handled.contains(field.name.as_str()) {
                continue;
            }
            let current = object.get_field(&field.name)?;
            let value = self.resolve(&current, &field.ty)?;
            steps.push(ObjectStep::WriteField {
                field: field.name.clone(),
                value,
            });
        }
        Ok(())
    }

    fn container_of(&self, ty: &TypeRef) -> Option<Container> {
        if ty.is_list_like() || ty.is_set_like() {
            return Some(Container::Collection);
        }
        if ty.is_map_like() {
            return Some(Container::Map);
        }
        let class = self.classes.get(ty.type_name()?.as_str())?;
        if class.is_collection() {
            Some(Container::Collection)
        } else if class.is_map() {
            Some(Container::Map)
        } else {
            None
        }
    }
}
