//! Hierarchy walking.
//!
//! A block's effective context is built from every node between it and the
//! root diagram. [`ancestors`] collects those nodes.

use std::collections::HashSet;

use log::{debug, trace};

use blockctx_core::node::NodeRef;

use crate::{config::ResolutionConfig, error::BlockCtxError, store::PropertyStore};

/// The chain of nodes from a start node up to its root diagram.
///
/// Stored start first and root last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: Vec<NodeRef>,
}

impl Hierarchy {
    /// The node the walk started from.
    pub fn start(&self) -> NodeRef {
        self.nodes[0]
    }

    /// The root diagram.
    pub fn root(&self) -> NodeRef {
        self.nodes[self.nodes.len() - 1]
    }

    /// Nodes from the start up to the root.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    /// Nodes from the root down to the start, the order contexts are merged in.
    pub fn root_first(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.iter().rev().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Collects `start` and every node above it, ending with the root diagram.
///
/// A diagram start yields just itself. A block start is followed by each
/// enclosing block, then by the parent diagram of the topmost block.
///
/// # Errors
///
/// - [`BlockCtxError::Cycle`] if a block is revisited or the chain grows past
///   `config.max_depth()` nodes.
/// - [`BlockCtxError::Store`] if a node or its parent diagram is missing.
pub fn ancestors<S>(
    store: &S,
    start: NodeRef,
    config: &ResolutionConfig,
) -> Result<Hierarchy, BlockCtxError>
where
    S: PropertyStore + ?Sized,
{
    if start.is_diagram() {
        return Ok(Hierarchy { nodes: vec![start] });
    }

    let mut nodes = vec![start];
    let mut visited = HashSet::from([start.id()]);
    let mut current = start;

    while let Some(parent) = store.parent_block(current)? {
        if !visited.insert(parent) || nodes.len() >= config.max_depth() {
            debug!(start:% = start, depth = nodes.len(); "Hierarchy walk did not terminate");
            return Err(BlockCtxError::Cycle {
                start,
                depth: nodes.len(),
            });
        }
        current = NodeRef::block(parent);
        nodes.push(current);
    }

    let diagram = store.parent_diagram(current)?;
    nodes.push(NodeRef::diagram(diagram));

    trace!(nodes:?; "Walked hierarchy");
    Ok(Hierarchy { nodes })
}
