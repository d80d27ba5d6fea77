//! Document files.
//!
//! A document describes a diagram hierarchy in TOML:
//!
//! ```toml
//! [[diagram]]
//! id = 1
//! context = ["rate = 100"]
//!
//! [[block]]
//! id = 10
//! parent_diagram = 1
//! context = ["period = 1 / rate"]
//!
//! [block.mask]
//! title = "Sampler"
//! entries = [{ name = "gain", value = "2", description = "Gain" }]
//!
//! [[block]]
//! id = 11
//! parent_block = 10
//! parent_diagram = 1
//! ```
//!
//! Masks may be given either as a `mask` table, which is encoded on load, or
//! as raw wire data under `exprs`.

use std::{collections::HashSet, fs, path::Path};

use log::{debug, info};
use serde::Deserialize;

use blockctx_core::{
    mask::{self, MaskDocument, MaskEntry},
    node::{NodeId, NodeRef},
    wire::WireValue,
};

use crate::{error::BlockCtxError, store::MemoryStore};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentFile {
    #[serde(default)]
    diagram: Vec<DiagramTable>,
    #[serde(default)]
    block: Vec<BlockTable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiagramTable {
    id: u64,
    #[serde(default)]
    context: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockTable {
    id: u64,
    #[serde(default)]
    parent_block: u64,
    parent_diagram: u64,
    #[serde(default)]
    context: Vec<String>,
    mask: Option<MaskTable>,
    exprs: Option<WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaskTable {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default)]
    entries: Vec<EntryTable>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryTable {
    name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    description: String,
}

fn default_title() -> String {
    mask::DEFAULT_TITLE.to_string()
}

impl From<MaskTable> for MaskDocument {
    fn from(table: MaskTable) -> Self {
        let entries = table
            .entries
            .into_iter()
            .map(|entry| MaskEntry::new(entry.name, entry.value, entry.description))
            .collect();
        MaskDocument::new(table.title).with_entries(entries)
    }
}

/// Parses a document into a [`MemoryStore`].
///
/// # Errors
///
/// Returns [`BlockCtxError::Toml`] for malformed TOML and
/// [`BlockCtxError::Document`] when a node is declared twice or a block has
/// both `mask` and `exprs`.
pub fn parse_document(text: &str) -> Result<MemoryStore, BlockCtxError> {
    let file: DocumentFile = toml::from_str(text)?;

    let mut store = MemoryStore::new();
    let mut seen = HashSet::new();
    let mut claim = |node: NodeRef| {
        if seen.insert(node) {
            Ok(())
        } else {
            Err(BlockCtxError::Document(format!("{node} is declared twice")))
        }
    };

    for diagram in file.diagram {
        let node = NodeRef::diagram(diagram.id);
        claim(node)?;
        store.add_diagram(diagram.id).context(diagram.context);
    }

    for block in file.block {
        let node = NodeRef::block(block.id);
        claim(node)?;

        let mut builder = store
            .add_block(block.id)
            .parent_diagram(block.parent_diagram)
            .context(block.context);
        if let Some(parent) = NodeId::from_raw_parent(block.parent_block) {
            builder = builder.parent_block(parent);
        }

        match (block.mask, block.exprs) {
            (Some(_), Some(_)) => {
                return Err(BlockCtxError::Document(format!(
                    "{node} sets both `mask` and `exprs`"
                )));
            }
            (Some(table), None) => {
                builder.mask(&MaskDocument::from(table));
            }
            (None, Some(exprs)) => {
                builder.exprs(exprs);
            }
            (None, None) => {}
        }
    }

    debug!(nodes = store.len(); "Document parsed");
    Ok(store)
}

/// Reads and parses the document at `path`.
pub fn load_document(path: impl AsRef<Path>) -> Result<MemoryStore, BlockCtxError> {
    let path = path.as_ref();
    info!(path:? = path; "Loading document");
    let text = fs::read_to_string(path)?;
    parse_document(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PropertyStore;

    #[test]
    fn test_parse_hierarchy() {
        let store = parse_document(
            r#"
            [[diagram]]
            id = 1
            context = ["rate = 100"]

            [[block]]
            id = 10
            parent_diagram = 1
            context = ["period = 1 / rate"]

            [block.mask]
            title = "Sampler"
            entries = [{ name = "gain", value = "2", description = "Gain" }]

            [[block]]
            id = 11
            parent_block = 10
            parent_diagram = 1
            "#,
        )
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.raw_context(NodeRef::diagram(1)).unwrap(),
            vec!["rate = 100"]
        );
        assert_eq!(store.parent_block(NodeRef::block(10)).unwrap(), None);
        assert_eq!(
            store.parent_block(NodeRef::block(11)).unwrap(),
            Some(NodeId::new(10))
        );

        let exprs = store.mask_exprs(NodeRef::block(10)).unwrap().unwrap();
        let document = mask::decode(&exprs).unwrap();
        assert_eq!(document.title(), "Sampler");
        assert_eq!(document.entries(), &[MaskEntry::new("gain", "2", "Gain")]);
        assert!(store.mask_exprs(NodeRef::block(11)).unwrap().is_none());
    }

    #[test]
    fn test_mask_title_defaults() {
        let store = parse_document(
            r#"
            [[diagram]]
            id = 1

            [[block]]
            id = 2
            parent_diagram = 1
            mask = { entries = [{ name = "k" }] }
            "#,
        )
        .unwrap();

        let exprs = store.mask_exprs(NodeRef::block(2)).unwrap().unwrap();
        let document = mask::decode(&exprs).unwrap();
        assert_eq!(document.title(), mask::DEFAULT_TITLE);
        assert_eq!(document.entries()[0].value(), "");
    }

    #[test]
    fn test_raw_exprs() {
        let store = parse_document(
            r#"
            [[diagram]]
            id = 1

            [[block]]
            id = 2
            parent_diagram = 1
            exprs = { type = "double", value = { rows = 0, cols = 0, data = [] } }
            "#,
        )
        .unwrap();

        assert_eq!(
            store.mask_exprs(NodeRef::block(2)).unwrap(),
            Some(WireValue::empty_double())
        );
    }

    #[test]
    fn test_overfilled_wire_matrix_is_rejected() {
        let err = parse_document(
            r#"
            [[diagram]]
            id = 1

            [[block]]
            id = 2
            parent_diagram = 1

            [block.exprs]
            type = "list"

            [[block.exprs.value]]
            type = "string"
            value = { rows = 1, cols = 1, data = ["1"] }

            [[block.exprs.value]]
            type = "list"
            value = [
                { type = "string", value = { rows = 1, cols = 1, data = ["k"] } },
                { type = "string", value = { rows = 2, cols = 1, data = ["T", "gain", "extra"] } },
                { type = "list", value = [] },
            ]
            "#,
        )
        .unwrap_err();

        match err {
            BlockCtxError::Toml(err) => {
                assert!(err.to_string().contains("cannot hold 3 cells"), "{err}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_nodes() {
        let err = parse_document(
            r#"
            [[diagram]]
            id = 1

            [[block]]
            id = 1
            parent_diagram = 1

            [[block]]
            id = 1
            parent_diagram = 1
            "#,
        )
        .unwrap_err();

        match err {
            BlockCtxError::Document(message) => assert_eq!(message, "block#1 is declared twice"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mask_and_exprs_conflict() {
        let err = parse_document(
            r#"
            [[diagram]]
            id = 1

            [[block]]
            id = 2
            parent_diagram = 1
            mask = { title = "T" }
            exprs = { type = "double", value = { rows = 0, cols = 0, data = [] } }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, BlockCtxError::Document(_)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            parse_document("[[block]]\nid = \"x\""),
            Err(BlockCtxError::Toml(_))
        ));
        assert!(matches!(
            parse_document("[[widget]]\nid = 1"),
            Err(BlockCtxError::Toml(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_document("/nonexistent/blockctx/document.toml"),
            Err(BlockCtxError::Io(_))
        ));
    }
}
