//! Mask customization model.
//!
//! A [`MaskCustomization`] is the editable state behind a mask editor: the
//! node's decoded mask, plus the evaluated context at that node so new rows
//! can be pre-filled from variables that are in scope but not yet exposed.

use std::fmt;

use log::{debug, info};

use blockctx_core::{
    mask::{self, MaskDocument, MaskEntry},
    node::NodeRef,
};

use crate::{
    broker::Broker,
    config::ResolutionConfig,
    error::BlockCtxError,
    resolve::resolve_all,
    session::{EvaluatedContext, EvaluationSession},
    store::{PropertyKey, PropertyStore, PropertyValue},
};

/// Prefix of names generated for rows without a matching context variable.
const GENERATED_PREFIX: &str = "generatedVar";

/// Value of a generated row.
const GENERATED_VALUE: &str = "[]";

/// Editable mask of one node.
#[derive(Debug, Clone)]
pub struct MaskCustomization<V> {
    node: NodeRef,
    document: MaskDocument,
    context: EvaluatedContext<V>,
}

impl<V: Clone + fmt::Display> MaskCustomization<V> {
    /// Opens the mask of `node` for editing.
    ///
    /// Takes the broker without waiting, evaluates the context resolved at
    /// `node`, releases the broker, then decodes the node's mask. A node
    /// without mask data starts from the default document.
    ///
    /// Returns `Ok(None)` when the broker is busy.
    ///
    /// # Errors
    ///
    /// Propagates resolution, session write, store and decode errors.
    pub fn open<S, P>(
        broker: &Broker<S>,
        store: &P,
        node: NodeRef,
        config: &ResolutionConfig,
    ) -> Result<Option<Self>, BlockCtxError>
    where
        S: EvaluationSession<Value = V>,
        P: PropertyStore + ?Sized,
    {
        let Some(mut handle) = broker.try_acquire() else {
            info!(node:% = node; "Evaluation session busy, not opening mask");
            return Ok(None);
        };
        let resolved = resolve_all(store, node, config)?;
        let context = handle.evaluate_context(resolved.statements())?;
        handle.release();

        let document = match store.mask_exprs(node)? {
            Some(exprs) => mask::decode(&exprs)?,
            None => MaskDocument::default(),
        };

        debug!(node:% = node, entries = document.len(), variables = context.len(); "Opened mask");
        Ok(Some(Self::new(node, document, context)))
    }

    pub fn new(node: NodeRef, document: MaskDocument, context: EvaluatedContext<V>) -> Self {
        Self {
            node,
            document,
            context,
        }
    }

    pub fn node(&self) -> NodeRef {
        self.node
    }

    pub fn document(&self) -> &MaskDocument {
        &self.document
    }

    /// The evaluated context the mask was opened with.
    pub fn context(&self) -> &EvaluatedContext<V> {
        &self.context
    }

    pub fn entries(&self) -> &[MaskEntry] {
        self.document.entries()
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.set_title(title);
    }

    fn is_allocated(&self, name: &str) -> bool {
        self.document.entries().iter().any(|entry| entry.name() == name)
    }

    /// Appends a row and returns its index.
    ///
    /// The row exposes the first context variable no row uses yet, with its
    /// evaluated value. When every variable is taken, a fresh
    /// `generatedVarN` bound to `[]` is used instead.
    pub fn insert_row(&mut self) -> usize {
        let free = self
            .context
            .iter()
            .find(|(name, _)| !self.is_allocated(name))
            .map(|(name, value)| (name.clone(), value.to_string()));

        let (name, value) = free.unwrap_or_else(|| {
            let name = (0..)
                .map(|n| format!("{GENERATED_PREFIX}{n}"))
                .find(|name| !self.context.contains_key(name) && !self.is_allocated(name))
                .unwrap_or_else(|| GENERATED_PREFIX.to_string());
            (name, GENERATED_VALUE.to_string())
        });

        let description = format!("Generated variable {name}");
        debug!(name = name.as_str(); "Inserting mask row");
        self.document
            .push(MaskEntry::new(name, value, description));
        self.document.len() - 1
    }

    /// Removes the row at `selected`, or the last row when nothing valid is
    /// selected. Returns the removed entry.
    pub fn remove_row(&mut self, selected: Option<usize>) -> Option<MaskEntry> {
        let entries = self.document.entries_mut();
        let index = match selected {
            Some(index) if index < entries.len() => index,
            _ => entries.len().checked_sub(1)?,
        };
        Some(entries.remove(index))
    }

    /// Swaps the row at `index` with the one above. Returns `false` at the top.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.len() {
            return false;
        }
        self.document.entries_mut().swap(index, index - 1);
        true
    }

    /// Swaps the row at `index` with the one below. Returns `false` at the bottom.
    pub fn move_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.len() {
            return false;
        }
        self.document.entries_mut().swap(index, index + 1);
        true
    }

    /// Grows or shrinks the mask to `count` rows.
    ///
    /// New rows are created as by [`insert_row`](Self::insert_row); extra
    /// rows are removed from the end.
    pub fn set_row_count(&mut self, count: usize) {
        while self.len() < count {
            self.insert_row();
        }
        self.document.entries_mut().truncate(count);
    }

    /// Replaces the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockCtxError::RowOutOfRange`] if there is no such row.
    pub fn set_entry(&mut self, index: usize, entry: MaskEntry) -> Result<(), BlockCtxError> {
        let len = self.len();
        let slot = self
            .document
            .entries_mut()
            .get_mut(index)
            .ok_or(BlockCtxError::RowOutOfRange { index, len })?;
        *slot = entry;
        Ok(())
    }

    /// Encodes the mask and stores it on the node.
    pub fn save<P>(&self, store: &mut P) -> Result<(), BlockCtxError>
    where
        P: PropertyStore + ?Sized,
    {
        info!(node:% = self.node, entries = self.document.len(); "Saving mask");
        let exprs = mask::encode(&self.document);
        store.set(self.node, PropertyKey::MaskExprs, PropertyValue::Exprs(Some(exprs)))?;
        Ok(())
    }

    /// Returns the edited document, discarding the context.
    pub fn into_document(self) -> MaskDocument {
        self.document
    }
}
