//! Metadata-instance literal provider.
//!
//! Metadata instances are not objects and cannot be decomposed. Instead a
//! literal type is synthesized per metadata contract: one element per
//! declared element and a positional constructor. Recording a metadata
//! instance yields a [`MetadataProxy`] naming that literal type; the
//! resolver turns it into a literal construction.

use crate::error::{RecordingError, RecordingResult};
use core_types::{LiteralType, MetadataContract, MetadataInstance, MetadataProxy, TypeName, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Generates and caches literal types for metadata contracts.
///
/// Types are cached per distinct contract. Contracts sharing a name but
/// declaring different elements get numbered literal names.
#[derive(Debug, Default)]
pub struct MetadataLiteralProvider {
    types: RwLock<HashMap<TypeName, Vec<(MetadataContract, Arc<LiteralType>)>>>,
    generated: AtomicUsize,
}

impl MetadataLiteralProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// The literal type for `contract`, generated on first request
    pub fn literal_type(&self, contract: &MetadataContract) -> Arc<LiteralType> {
        if let Some(literal) = cached(&self.types.read(), contract) {
            return literal;
        }
        let mut types = self.types.write();
        if let Some(literal) = cached(&types, contract) {
            return literal;
        }
        let variants = types.entry(contract.name().clone()).or_default();
        let mut literal = LiteralType::for_contract(contract);
        if !variants.is_empty() {
            literal.name = TypeName::new(format!("{}{}", literal.name, variants.len() + 1));
        }
        self.generated.fetch_add(1, Ordering::Relaxed);
        debug!(literal = %literal.name, contract = %contract.name(), "generated literal type");
        let literal = Arc::new(literal);
        variants.push((contract.clone(), literal.clone()));
        literal
    }

    /// Wrap a metadata instance so it can be recorded.
    ///
    /// `defaults` supply values for elements the instance leaves unset and
    /// the contract declares no default for.
    pub fn proxy(
        &self,
        instance: MetadataInstance,
        contract: &Arc<MetadataContract>,
        defaults: Vec<(String, Value)>,
    ) -> RecordingResult<Value> {
        if instance.contract() != contract.name() {
            return Err(RecordingError::MetadataContractMismatch {
                instance: instance.contract().clone(),
                contract: contract.name().clone(),
            });
        }
        if let Some((name, _)) = instance
            .values()
            .iter()
            .find(|(name, _)| contract.element_named(name).is_none())
        {
            return Err(RecordingError::UnknownElement {
                contract: contract.name().clone(),
                element: name.clone(),
            });
        }
        let literal = self.literal_type(contract);
        Ok(Value::MetadataProxy(Arc::new(MetadataProxy::new(
            literal,
            contract.clone(),
            instance,
            defaults,
        ))))
    }

    /// Number of literal types generated
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    /// All generated literal types, ordered by name
    pub fn generated_types(&self) -> Vec<Arc<LiteralType>> {
        let mut types: Vec<_> = self
            .types
            .read()
            .values()
            .flatten()
            .map(|(_, literal)| literal.clone())
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        types
    }

    /// Drop all cached literal types
    pub fn clear(&self) {
        self.types.write().clear();
    }
}

fn cached(
    types: &HashMap<TypeName, Vec<(MetadataContract, Arc<LiteralType>)>>,
    contract: &MetadataContract,
) -> Option<Arc<LiteralType>> {
    types
        .get(contract.name())?
        .iter()
        .find(|(known, _)| known == contract)
        .map(|(_, literal)| literal.clone())
}
