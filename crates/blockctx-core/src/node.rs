//! Node and owner references.
//!
//! A [`NodeRef`] addresses a single point of the document hierarchy: either a
//! block or the diagram at the root. It is the key used for every property
//! store access.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a document node.
///
/// Identifiers are only meaningful together with a [`NodeKind`]; the same raw
/// value may name a block and a diagram at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates an identifier from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Converts a raw parent reference where `0` means "no parent".
    ///
    /// # Examples
    ///
    /// ```
    /// use blockctx_core::node::NodeId;
    ///
    /// assert_eq!(NodeId::from_raw_parent(0), None);
    /// assert_eq!(NodeId::from_raw_parent(7), Some(NodeId::new(7)));
    /// ```
    pub fn from_raw_parent(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Returns the raw identifier value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// The kind of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A block, possibly nested inside other blocks.
    Block,
    /// The root diagram.
    Diagram,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Block => write!(f, "block"),
            NodeKind::Diagram => write!(f, "diagram"),
        }
    }
}

/// Reference to a block or diagram, identified by `(id, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    id: NodeId,
    kind: NodeKind,
}

impl NodeRef {
    /// Creates a reference from an identifier and a kind.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Creates a block reference.
    pub fn block(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Block)
    }

    /// Creates a diagram reference.
    pub fn diagram(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Diagram)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns `true` if this reference names a diagram.
    pub fn is_diagram(&self) -> bool {
        self.kind == NodeKind::Diagram
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_includes_kind() {
        assert_eq!(NodeRef::block(3), NodeRef::block(3));
        assert_ne!(NodeRef::block(3), NodeRef::diagram(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeRef::block(12).to_string(), "block#12");
        assert_eq!(NodeRef::diagram(1).to_string(), "diagram#1");
    }

    #[test]
    fn test_raw_parent_zero_is_none() {
        assert!(NodeId::from_raw_parent(0).is_none());
        assert_eq!(NodeId::from_raw_parent(42).map(NodeId::get), Some(42));
    }

    #[test]
    fn test_is_diagram() {
        assert!(NodeRef::diagram(1).is_diagram());
        assert!(!NodeRef::block(1).is_diagram());
    }
}
