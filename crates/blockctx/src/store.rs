//! Property store access.
//!
//! Blocks and diagrams keep their context data in a property store owned by
//! the host application. [`PropertyStore`] is the adapter the resolver reads
//! through; [`MemoryStore`] is an in-memory implementation used by document
//! files and tests.

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use blockctx_core::{
    mask::{self, MaskDocument},
    node::{NodeId, NodeKind, NodeRef},
    wire::WireValue,
};

/// The properties the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Raw context statements, one per line.
    RawContext,
    /// Encoded mask data, if the node has a mask.
    MaskExprs,
    /// Enclosing block, absent for top-level blocks.
    ParentBlock,
    /// Diagram owning a top-level block.
    ParentDiagram,
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKey::RawContext => "raw context",
            PropertyKey::MaskExprs => "mask exprs",
            PropertyKey::ParentBlock => "parent block",
            PropertyKey::ParentDiagram => "parent diagram",
        };
        f.write_str(name)
    }
}

/// A property value, typed per [`PropertyKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Strings(Vec<String>),
    Exprs(Option<WireValue>),
    Parent(Option<NodeId>),
    Id(NodeId),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Strings(_) => "strings",
            PropertyValue::Exprs(_) => "exprs",
            PropertyValue::Parent(_) => "optional id",
            PropertyValue::Id(_) => "id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("{0} does not exist")]
    MissingNode(NodeRef),

    #[error("{node} has no {key}")]
    MissingProperty { node: NodeRef, key: PropertyKey },

    #[error("expected {expected} for {key}, found {found}")]
    WrongType {
        key: PropertyKey,
        expected: &'static str,
        found: &'static str,
    },
}

/// Read and write access to node properties.
///
/// Only [`get`](PropertyStore::get) and [`set`](PropertyStore::set) must be
/// implemented; the typed accessors check the value variant.
pub trait PropertyStore {
    fn get(&self, node: NodeRef, key: PropertyKey) -> Result<PropertyValue, StoreError>;

    fn set(&mut self, node: NodeRef, key: PropertyKey, value: PropertyValue)
    -> Result<(), StoreError>;

    fn raw_context(&self, node: NodeRef) -> Result<Vec<String>, StoreError> {
        match self.get(node, PropertyKey::RawContext)? {
            PropertyValue::Strings(lines) => Ok(lines),
            other => Err(wrong_type(PropertyKey::RawContext, "strings", &other)),
        }
    }

    fn mask_exprs(&self, node: NodeRef) -> Result<Option<WireValue>, StoreError> {
        match self.get(node, PropertyKey::MaskExprs)? {
            PropertyValue::Exprs(exprs) => Ok(exprs),
            other => Err(wrong_type(PropertyKey::MaskExprs, "exprs", &other)),
        }
    }

    fn parent_block(&self, node: NodeRef) -> Result<Option<NodeId>, StoreError> {
        match self.get(node, PropertyKey::ParentBlock)? {
            PropertyValue::Parent(parent) => Ok(parent),
            other => Err(wrong_type(PropertyKey::ParentBlock, "optional id", &other)),
        }
    }

    fn parent_diagram(&self, node: NodeRef) -> Result<NodeId, StoreError> {
        match self.get(node, PropertyKey::ParentDiagram)? {
            PropertyValue::Id(id) => Ok(id),
            other => Err(wrong_type(PropertyKey::ParentDiagram, "id", &other)),
        }
    }
}

fn wrong_type(key: PropertyKey, expected: &'static str, found: &PropertyValue) -> StoreError {
    StoreError::WrongType {
        key,
        expected,
        found: found.type_name(),
    }
}

/// Properties of one node.
#[derive(Debug, Clone, Default, PartialEq)]
struct NodeData {
    raw_context: Vec<String>,
    mask_exprs: Option<WireValue>,
    parent_block: Option<NodeId>,
    parent_diagram: Option<NodeId>,
}

/// An in-memory [`PropertyStore`].
///
/// Nodes keep insertion order, so listings are deterministic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: IndexMap<NodeRef, NodeData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagram, or returns a builder for an existing one.
    pub fn add_diagram(&mut self, id: impl Into<NodeId>) -> NodeBuilder<'_> {
        self.node(NodeRef::diagram(id))
    }

    /// Adds a block, or returns a builder for an existing one.
    pub fn add_block(&mut self, id: impl Into<NodeId>) -> NodeBuilder<'_> {
        self.node(NodeRef::block(id))
    }

    fn node(&mut self, node: NodeRef) -> NodeBuilder<'_> {
        NodeBuilder {
            data: self.nodes.entry(node).or_default(),
        }
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Returns every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, node: NodeRef) -> Result<&NodeData, StoreError> {
        self.nodes.get(&node).ok_or(StoreError::MissingNode(node))
    }
}

impl PropertyStore for MemoryStore {
    fn get(&self, node: NodeRef, key: PropertyKey) -> Result<PropertyValue, StoreError> {
        let data = self.data(node)?;
        match key {
            PropertyKey::RawContext => Ok(PropertyValue::Strings(data.raw_context.clone())),
            PropertyKey::MaskExprs => Ok(PropertyValue::Exprs(data.mask_exprs.clone())),
            PropertyKey::ParentBlock => Ok(PropertyValue::Parent(data.parent_block)),
            PropertyKey::ParentDiagram => data
                .parent_diagram
                .map(PropertyValue::Id)
                .ok_or(StoreError::MissingProperty { node, key }),
        }
    }

    fn set(
        &mut self,
        node: NodeRef,
        key: PropertyKey,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        let data = self
            .nodes
            .get_mut(&node)
            .ok_or(StoreError::MissingNode(node))?;

        debug!(node:% = node, key:% = key; "Setting property");
        match (key, value) {
            (PropertyKey::RawContext, PropertyValue::Strings(lines)) => data.raw_context = lines,
            (PropertyKey::MaskExprs, PropertyValue::Exprs(exprs)) => data.mask_exprs = exprs,
            (PropertyKey::ParentBlock, PropertyValue::Parent(parent))
                if node.kind() == NodeKind::Block =>
            {
                data.parent_block = parent
            }
            (PropertyKey::ParentDiagram, PropertyValue::Id(id)) if node.kind() == NodeKind::Block => {
                data.parent_diagram = Some(id)
            }
            (PropertyKey::ParentBlock | PropertyKey::ParentDiagram, _)
                if node.kind() == NodeKind::Diagram =>
            {
                return Err(StoreError::MissingProperty { node, key });
            }
            (key, other) => {
                let expected = match key {
                    PropertyKey::RawContext => "strings",
                    PropertyKey::MaskExprs => "exprs",
                    PropertyKey::ParentBlock => "optional id",
                    PropertyKey::ParentDiagram => "id",
                };
                return Err(wrong_type(key, expected, &other));
            }
        }
        Ok(())
    }
}

/// Fills in the properties of a [`MemoryStore`] node.
#[derive(Debug)]
pub struct NodeBuilder<'a> {
    data: &'a mut NodeData,
}

impl NodeBuilder<'_> {
    pub fn context<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data.raw_context = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Stores raw wire data, which may be malformed.
    pub fn exprs(self, exprs: WireValue) -> Self {
        self.data.mask_exprs = Some(exprs);
        self
    }

    /// Stores an encoded mask.
    pub fn mask(self, document: &MaskDocument) -> Self {
        self.exprs(mask::encode(document))
    }

    pub fn parent_block(self, parent: impl Into<NodeId>) -> Self {
        self.data.parent_block = Some(parent.into());
        self
    }

    pub fn parent_diagram(self, diagram: impl Into<NodeId>) -> Self {
        self.data.parent_diagram = Some(diagram.into());
        self
    }
}
