//! Mapping recorded values onto deferred value nodes.
//!
//! Rules are tried in a fixed order; the first that applies decides how
//! the value is rebuilt:
//!
//! 1. null
//! 2. a registered [`ObjectLoader`](crate::ObjectLoader) claims the value
//! 3. built-in empty and singleton containers
//! 4. a substitution registered for the value's type or the declared type
//! 5. optionals
//! 6. scalars, strings, enum constants and class references
//! 7. placeholders of earlier recorded calls
//! 8. arrays
//! 9. metadata literals
//! 10. general object decomposition (see [`crate::decompose`])

use crate::error::{RecordingError, RecordingResult};
use crate::graph::{NodeId, NodeKind, ValueGraph};
use crate::registry::Registrations;
use bytecode_system::{CollectionShape, Constant};
use core_types::{
    ClassRegistry, IdentityKey, LiteralType, MetadataProxy, ObjectRef, PrimitiveType, TypeName,
    TypeRef, Value,
};
use std::sync::Arc;
use tracing::trace;

/// Resolves values into nodes of one session's graph
pub(crate) struct Resolver<'a> {
    pub(crate) graph: &'a mut ValueGraph,
    pub(crate) classes: &'a ClassRegistry,
    pub(crate) registrations: &'a Registrations,
    pub(crate) static_init: bool,
    pub(crate) literal_types: &'a mut Vec<Arc<LiteralType>>,
}

impl<'a> Resolver<'a> {
    /// Resolve `value`, declared as `expected`, to a node
    pub(crate) fn resolve(&mut self, value: &Value, expected: &TypeRef) -> RecordingResult<NodeId> {
        let key = value.identity();
        if let Some(id) = self.graph.lookup(&key) {
            return Ok(id);
        }
        if self.graph.is_sealed() {
            return Err(RecordingError::AlreadyFinalized);
        }
        trace!(kind = %value.kind_name(), expected = %expected, "resolving value");

        if value.is_null() {
            return self.graph.add(Some(key), NodeKind::Null);
        }

        if let Some(loader) = self.registrations.loader_for(value, self.static_init) {
            return self.graph.add(
                Some(key),
                NodeKind::Loaded {
                    loader,
                    value: value.clone(),
                },
            );
        }

        if let Value::Object(object) = value {
            if let Some(shape) = CollectionShape::from_class_name(object.type_name().as_str()) {
                return self.resolve_shape(key, object, shape);
            }
        }

        let value_type = value.type_name();
        if let Some(holder) = self.registrations.substitution_for(value_type.as_ref(), expected) {
            let serialized =
                holder
                    .substitution
                    .serialize(value)
                    .map_err(|source| RecordingError::Substitution {
                        ty: holder.from.clone(),
                        source,
                    })?;
            self.graph.retain(&serialized);
            let id = self.graph.reserve(Some(key))?;
            let to = holder.to.clone();
            let substitution = holder.id.clone();
            let serialized = self.resolve(&serialized, &to)?;
            self.graph.fill(
                id,
                NodeKind::Substituted {
                    substitution,
                    serialized,
                },
            )?;
            return Ok(id);
        }

        match value {
            Value::Optional(payload) => {
                let id = self.graph.reserve(Some(key))?;
                let payload = match payload {
                    Some(inner) => Some(self.resolve(inner, &TypeRef::Any)?),
                    None => None,
                };
                self.graph.fill(id, NodeKind::Optional(payload))?;
                Ok(id)
            }
            Value::Enum(constant) => self.graph.add(
                Some(key),
                NodeKind::Enum {
                    ty: constant.ty.clone(),
                    name: constant.name.clone(),
                },
            ),
            Value::Class(name) => {
                self.check_class(name)?;
                self.graph.add(Some(key), NodeKind::Class(name.clone()))
            }
            Value::Placeholder(placeholder) => {
                if self.static_init && !placeholder.is_static_init() {
                    return Err(RecordingError::PhaseMismatch {
                        label: placeholder.label(),
                    });
                }
                self.graph.add(
                    Some(key),
                    NodeKind::ContextValue {
                        key: placeholder.key().to_string(),
                    },
                )
            }
            Value::Array(array) => {
                let id = self.graph.reserve(Some(key))?;
                let component = array.component().clone();
                let mut elements = Vec::with_capacity(array.len());
                for element in array.elements() {
                    elements.push(self.resolve(&element, &component)?);
                }
                self.graph.fill(
                    id,
                    NodeKind::Array {
                        component,
                        elements,
                    },
                )?;
                Ok(id)
            }
            Value::MetadataProxy(proxy) => self.resolve_metadata(key, proxy),
            Value::Object(object) => self.decompose(key, object, expected),
            Value::Metadata(_) | Value::Native(_) => {
                Err(RecordingError::UnsupportedValue(value.kind_name()))
            }
            scalar => match Constant::from_value(scalar) {
                Some(constant) => self.graph.add(Some(key), NodeKind::Constant(constant)),
                None => Err(RecordingError::UnsupportedValue(scalar.kind_name())),
            },
        }
    }

    fn resolve_shape(
        &mut self,
        key: IdentityKey,
        object: &ObjectRef,
        shape: CollectionShape,
    ) -> RecordingResult<NodeId> {
        let id = self.graph.reserve(Some(key))?;
        let mut sources = Vec::with_capacity(shape.arity());
        match shape {
            CollectionShape::SingletonMap => {
                for (k, v) in object.entries()?.into_iter().take(1) {
                    sources.push(k);
                    sources.push(v);
                }
            }
            _ => sources.extend(object.elements().unwrap_or_default().into_iter().take(shape.arity())),
        }
        if sources.len() != shape.arity() {
            return Err(RecordingError::InternalConsistency(format!(
                "{} holds {} value(s), expected {}",
                object.type_name(),
                sources.len(),
                shape.arity()
            )));
        }
        let mut items = Vec::with_capacity(sources.len());
        for source in &sources {
            items.push(self.resolve(source, &TypeRef::Any)?);
        }
        self.graph.fill(id, NodeKind::Collection { shape, items })?;
        Ok(id)
    }

    fn resolve_metadata(
        &mut self,
        key: IdentityKey,
        proxy: &Arc<MetadataProxy>,
    ) -> RecordingResult<NodeId> {
        let id = self.graph.reserve(Some(key))?;
        let contract = proxy.contract().clone();
        let mut args = Vec::with_capacity(contract.elements().len());
        for element in contract.elements() {
            let value = proxy
                .instance()
                .explicit(&element.name)
                .or(element.default.as_ref())
                .or_else(|| proxy.default_for(&element.name))
                .ok_or_else(|| RecordingError::MetadataValueMissing {
                    contract: contract.name().clone(),
                    element: element.name.clone(),
                })?
                .clone();
            self.graph.retain(&value);
            args.push(self.resolve(&value, &element.ty)?);
        }
        let literal = proxy.literal_type();
        if !self.literal_types.iter().any(|t| t.name == literal.name) {
            self.literal_types.push(literal.clone());
        }
        self.graph.fill(
            id,
            NodeKind::MetadataLiteral {
                literal: literal.name.clone(),
                args,
            },
        )?;
        Ok(id)
    }

    fn check_class(&self, name: &TypeName) -> RecordingResult<()> {
        if PrimitiveType::from_name(name.as_str()).is_some()
            || self.classes.contains(name.as_str())
            || self.registrations.is_class_proxy(name)
        {
            Ok(())
        } else {
            Err(core_types::ValueError::UnknownClass(name.clone()).into())
        }
    }
}
