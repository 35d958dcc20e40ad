//! The deferred value graph.
//!
//! Every value an emitted program must rebuild is a node in an arena. Nodes
//! refer to each other by [`NodeId`], never by ownership, so shared and
//! cyclic inputs map onto a graph of the same shape. An identity map from
//! [`IdentityKey`] to node deduplicates repeated references.
//!
//! A node is reserved (and registered in the identity map) before its
//! children are resolved, then filled in. Once recording ends the graph is
//! sealed: no node may be added afterwards, and every node that is not
//! re-loadable inline is given a provisional slot. The emitter keeps only
//! the slots read from a later unit.

use crate::error::{RecordingError, RecordingResult};
use bytecode_system::{CollectionShape, Constant, SlotId};
use core_types::{IdentityKey, TypeName, TypeRef, Value};
use std::collections::HashMap;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// How an object node is constructed
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    /// No-arg constructor of `ty`
    Default {
        /// Concrete type to construct
        ty: TypeName,
    },
    /// Explicit constructor
    WithArgs {
        /// Concrete type to construct
        ty: TypeName,
        /// Constructor parameter types
        params: Vec<TypeRef>,
        /// Argument nodes
        args: Vec<NodeId>,
    },
}

impl Construction {
    /// Type being constructed
    pub fn type_name(&self) -> &TypeName {
        match self {
            Construction::Default { ty } | Construction::WithArgs { ty, .. } => ty,
        }
    }
}

/// A side-effecting step applied to an object after construction
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectStep {
    /// Add an element to the collection
    Append(NodeId),
    /// Put an entry into the map
    Put(NodeId, NodeId),
    /// Add an element to the collection held by a read-only property
    AppendToProperty {
        /// Property name
        property: String,
        /// Element node
        item: NodeId,
    },
    /// Put an entry into the map held by a read-only property
    PutIntoProperty {
        /// Property name
        property: String,
        /// Key node
        key: NodeId,
        /// Value node
        value: NodeId,
    },
    /// Call a property mutator
    SetProperty {
        /// Property name
        property: String,
        /// Value node
        value: NodeId,
    },
    /// Write a public field
    WriteField {
        /// Field name
        field: String,
        /// Value node
        value: NodeId,
    },
}

impl ObjectStep {
    /// Nodes the step reads
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            ObjectStep::Append(item) => vec![*item],
            ObjectStep::Put(key, value) => vec![*key, *value],
            ObjectStep::AppendToProperty { item, .. } => vec![*item],
            ObjectStep::PutIntoProperty { key, value, .. } => vec![*key, *value],
            ObjectStep::SetProperty { value, .. } | ObjectStep::WriteField { value, .. } => {
                vec![*value]
            }
        }
    }
}

/// What a node rebuilds
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Reserved but not yet filled in
    Reserved,
    /// Null
    Null,
    /// Scalar or string literal
    Constant(Constant),
    /// Enum constant
    Enum {
        /// Declaring type
        ty: TypeName,
        /// Constant name
        name: String,
    },
    /// Class reference
    Class(TypeName),
    /// Value published in the startup context under a key
    ContextValue {
        /// Context key
        key: String,
    },
    /// Value produced by an external loader
    Loaded {
        /// Loader index
        loader: usize,
        /// Source value handed to the loader
        value: Value,
    },
    /// Built-in empty or singleton container
    Collection {
        /// Container shape
        shape: CollectionShape,
        /// Element or entry nodes
        items: Vec<NodeId>,
    },
    /// Value rebuilt from a serialized stand-in
    Substituted {
        /// Substitution id
        substitution: String,
        /// Stand-in node
        serialized: NodeId,
    },
    /// Optional, present when set
    Optional(Option<NodeId>),
    /// Array with per-element nodes
    Array {
        /// Component type
        component: TypeRef,
        /// Element nodes
        elements: Vec<NodeId>,
    },
    /// Metadata literal built through its positional constructor
    MetadataLiteral {
        /// Literal type name
        literal: TypeName,
        /// Element nodes, in declaration order
        args: Vec<NodeId>,
    },
    /// Constructed object plus post-construction steps
    Object {
        /// Construction strategy
        construction: Construction,
        /// Steps applied after construction
        steps: Vec<ObjectStep>,
    },
    /// Recorder instance
    Recorder {
        /// Contract name
        contract: TypeName,
    },
}

impl NodeKind {
    /// Whether the node is re-loaded in every unit rather than kept in a slot
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Null
                | NodeKind::Constant(_)
                | NodeKind::Enum { .. }
                | NodeKind::Class(_)
                | NodeKind::ContextValue { .. }
        )
    }

    /// Nodes this node refers to
    pub fn predecessors(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Collection { items, .. } => items.clone(),
            NodeKind::Substituted { serialized, .. } => vec![*serialized],
            NodeKind::Optional(payload) => payload.iter().copied().collect(),
            NodeKind::Array { elements, .. } => elements.clone(),
            NodeKind::MetadataLiteral { args, .. } => args.clone(),
            NodeKind::Object {
                construction,
                steps,
            } => {
                let mut nodes = match construction {
                    Construction::WithArgs { args, .. } => args.clone(),
                    Construction::Default { .. } => Vec::new(),
                };
                nodes.extend(steps.iter().flat_map(|s| s.inputs()));
                nodes
            }
            _ => Vec::new(),
        }
    }
}

/// Materialization progress of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Not yet emitted
    Pending,
    /// Emission in progress
    Preparing,
    /// Emitted; later reads go through its slot
    Prepared,
}

/// One deferred value
#[derive(Debug, Clone)]
pub struct DeferredNode {
    kind: NodeKind,
    slot: Option<SlotId>,
    state: NodeState,
    materializations: u32,
}

impl DeferredNode {
    /// What the node rebuilds
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Slot holding the node's value, for non-inline nodes of a sealed graph
    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    /// Materialization progress
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Number of times the node was materialized
    pub fn materializations(&self) -> u32 {
        self.materializations
    }
}

/// Arena of deferred values with identity memoization
#[derive(Debug, Default)]
pub struct ValueGraph {
    nodes: Vec<DeferredNode>,
    identities: HashMap<IdentityKey, NodeId>,
    recorders: HashMap<TypeName, NodeId>,
    retained: Vec<Value>,
    sealed: bool,
    slot_count: u32,
}

impl ValueGraph {
    /// Create an empty, unsealed graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Node previously registered for `key`
    pub fn lookup(&self, key: &IdentityKey) -> Option<NodeId> {
        self.identities.get(key).copied()
    }

    /// Keep a value created during resolution alive for the graph's lifetime.
    ///
    /// Reference identities are addresses; a dropped temporary could free
    /// an address that a later temporary reuses and then match its node.
    pub fn retain(&mut self, value: &Value) {
        self.retained.push(value.clone());
    }

    /// Reserve a node, registering it under `key` when given
    pub fn reserve(&mut self, key: Option<IdentityKey>) -> RecordingResult<NodeId> {
        if self.sealed {
            return Err(RecordingError::AlreadyFinalized);
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(DeferredNode {
            kind: NodeKind::Reserved,
            slot: None,
            state: NodeState::Pending,
            materializations: 0,
        });
        if let Some(key) = key {
            self.identities.insert(key, id);
        }
        Ok(id)
    }

    /// Fill in a reserved node
    pub fn fill(&mut self, id: NodeId, kind: NodeKind) -> RecordingResult<()> {
        let node = self.node_mut(id)?;
        if !matches!(node.kind, NodeKind::Reserved) {
            return Err(RecordingError::InternalConsistency(format!(
                "node {} filled twice",
                id.0
            )));
        }
        node.kind = kind;
        Ok(())
    }

    /// Reserve and fill a node in one go
    pub fn add(&mut self, key: Option<IdentityKey>, kind: NodeKind) -> RecordingResult<NodeId> {
        let id = self.reserve(key)?;
        self.fill(id, kind)?;
        Ok(id)
    }

    /// The recorder node for a contract, created on first use
    pub fn recorder(&mut self, contract: &TypeName) -> RecordingResult<NodeId> {
        if let Some(id) = self.recorders.get(contract) {
            return Ok(*id);
        }
        let id = self.add(
            None,
            NodeKind::Recorder {
                contract: contract.clone(),
            },
        )?;
        self.recorders.insert(contract.clone(), id);
        Ok(id)
    }

    /// Seal the graph and assign provisional slots; returns their count
    pub fn seal(&mut self) -> RecordingResult<u32> {
        if self.sealed {
            return Ok(self.slot_count);
        }
        let mut next = 0u32;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if matches!(node.kind, NodeKind::Reserved) {
                return Err(RecordingError::InternalConsistency(format!(
                    "node {} was reserved but never filled",
                    index
                )));
            }
            if !node.kind.is_inline() {
                node.slot = Some(SlotId(next));
                next += 1;
            }
        }
        self.sealed = true;
        self.slot_count = next;
        Ok(next)
    }

    /// Whether the graph is sealed
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of provisional slots; zero before sealing
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> RecordingResult<&DeferredNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| RecordingError::InternalConsistency(format!("unknown node {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> RecordingResult<&mut DeferredNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| RecordingError::InternalConsistency(format!("unknown node {}", id.0)))
    }

    /// Move a node into the preparing state.
    ///
    /// Fails when the graph is not sealed or the node is already being
    /// prepared; both mean the emitter is broken.
    pub fn begin_materialize(&mut self, id: NodeId) -> RecordingResult<()> {
        if !self.sealed {
            return Err(RecordingError::InternalConsistency(format!(
                "node {} materialized before the graph was sealed",
                id.0
            )));
        }
        let node = self.node_mut(id)?;
        match node.state {
            NodeState::Pending => {
                node.state = NodeState::Preparing;
                node.materializations += 1;
                Ok(())
            }
            NodeState::Preparing => Err(RecordingError::InternalConsistency(format!(
                "node {} is already being materialized; its construction depends on itself",
                id.0
            ))),
            NodeState::Prepared => Err(RecordingError::InternalConsistency(format!(
                "node {} materialized twice",
                id.0
            ))),
        }
    }

    /// Mark a node prepared
    pub fn finish_materialize(&mut self, id: NodeId) -> RecordingResult<()> {
        let node = self.node_mut(id)?;
        node.state = NodeState::Prepared;
        Ok(())
    }

    /// Iterate over all nodes
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DeferredNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}
