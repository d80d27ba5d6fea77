//! Context resolution.
//!
//! Resolution turns a node's hierarchy into one ordered list of statements.
//! Contributions are appended root first, so when the statements are
//! evaluated in order a binding made closer to the start node overrides one
//! made closer to the root.

use std::fmt;

use log::{debug, info};

use blockctx_core::{mask, node::NodeRef};

use crate::{
    config::ResolutionConfig,
    error::BlockCtxError,
    hierarchy::ancestors,
    store::{PropertyKey, PropertyStore, PropertyValue},
};

/// Ordered statements making up a node's effective context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedContext {
    statements: Vec<String>,
}

impl ResolvedContext {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for ResolvedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}

/// Resolves the full context visible at `start`.
///
/// For each node from the root diagram down to `start`, appends the node's
/// raw context, one blank separator line, then `name = value` for every
/// entry of the node's mask. Mask values are copied verbatim.
///
/// # Errors
///
/// Propagates hierarchy errors, store errors and [`BlockCtxError::Shape`]
/// when a node's mask data cannot be decoded.
pub fn resolve_all<S>(
    store: &S,
    start: NodeRef,
    config: &ResolutionConfig,
) -> Result<ResolvedContext, BlockCtxError>
where
    S: PropertyStore + ?Sized,
{
    info!(start:% = start; "Resolving context");
    let hierarchy = ancestors(store, start, config)?;

    let mut statements = Vec::new();
    for node in hierarchy.root_first() {
        statements.extend(store.raw_context(node)?);
        statements.push(String::new());

        if let Some(exprs) = store.mask_exprs(node)? {
            let document = mask::decode(&exprs)?;
            debug!(node:% = node, entries = document.len(); "Appending mask assignments");
            statements.extend(document.assignments());
        }
    }

    debug!(nodes = hierarchy.len(), statements = statements.len(); "Context resolved");
    Ok(ResolvedContext { statements })
}

/// Replaces the raw context of `node`.
pub fn set_raw_context<S, I, L>(store: &mut S, node: NodeRef, lines: I) -> Result<(), BlockCtxError>
where
    S: PropertyStore + ?Sized,
    I: IntoIterator<Item = L>,
    L: Into<String>,
{
    let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
    debug!(node:% = node, lines = lines.len(); "Storing raw context");
    store.set(node, PropertyKey::RawContext, PropertyValue::Strings(lines))?;
    Ok(())
}
