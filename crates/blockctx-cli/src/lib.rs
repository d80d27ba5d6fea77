//! blockctx CLI library
//!
//! This module contains the core CLI logic for the blockctx tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, NodeArgs};

use std::io::Write;

use log::info;
use serde::Serialize;

use blockctx::{
    BlockCtxError, ContextBuilder,
    document::load_document,
    mask::MaskDocument,
    node::NodeRef,
    session::SessionError,
    store::{MemoryStore, PropertyStore},
    wire::WireValue,
};

/// Run the blockctx CLI application
///
/// Loads the document named in `args`, runs the selected command on it and
/// writes the result to `out`.
///
/// # Errors
///
/// Returns `BlockCtxError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed documents or mask data
/// - Hierarchy and script errors
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), BlockCtxError> {
    info!(document_path = args.document; "Processing document");

    let app_config = config::load_config(args.config.as_ref())?;
    let store = load_document(&args.document)?;
    let builder = ContextBuilder::new(app_config);

    match &args.command {
        Command::Resolve(node) => {
            let resolved = builder.resolve(&store, node.node())?;
            write!(out, "{resolved}")?;
        }
        Command::Evaluate(node) => evaluate(&builder, &store, node.node(), out)?,
        Command::Check => check(&builder, &store, out)?,
        Command::Mask { node, rows, title } => {
            let broker = builder.broker();
            let Some(mut custom) = builder.open_mask(&broker, &store, node.node())? else {
                return Err(SessionError::Evaluation("session is busy".to_string()).into());
            };
            if let Some(rows) = rows {
                custom.set_row_count(*rows);
            }
            if let Some(title) = title {
                custom.set_title(title.clone());
            }
            print_mask(custom.document(), out)?;
        }
        Command::Wire(node) => {
            let exprs = store.mask_exprs(node.node())?;
            print_wire(exprs, out)?;
        }
    }

    info!("Command completed");
    Ok(())
}

fn evaluate(
    builder: &ContextBuilder,
    store: &MemoryStore,
    node: NodeRef,
    out: &mut impl Write,
) -> Result<(), BlockCtxError> {
    // Surface script errors with spans instead of silently keeping old values.
    let resolved = builder.resolve(store, node)?;
    let context = builder.check(resolved.statements())?;
    for (name, value) in &context {
        writeln!(out, "{name} = {value}")?;
    }
    Ok(())
}

fn check(
    builder: &ContextBuilder,
    store: &MemoryStore,
    out: &mut impl Write,
) -> Result<(), BlockCtxError> {
    for node in store.nodes() {
        let resolved = builder.resolve(store, node)?;
        let context = builder.check(resolved.statements())?;
        writeln!(out, "{node}: ok ({} variables)", context.len())?;
    }
    Ok(())
}

fn print_mask(document: &MaskDocument, out: &mut impl Write) -> Result<(), BlockCtxError> {
    writeln!(out, "# {}", document.title())?;
    for entry in document.entries() {
        writeln!(out, "{}  # {}", entry.assignment(), entry.description())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct WireDump {
    exprs: WireValue,
}

fn print_wire(exprs: Option<WireValue>, out: &mut impl Write) -> Result<(), BlockCtxError> {
    let Some(exprs) = exprs else {
        writeln!(out, "# no mask data")?;
        return Ok(());
    };
    let text = toml::to_string(&WireDump { exprs })
        .map_err(|err| BlockCtxError::Document(err.to_string()))?;
    write!(out, "{text}")?;
    Ok(())
}
