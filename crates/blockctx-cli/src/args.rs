//! Command-line argument definitions for the blockctx CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the document, the command to run on it,
//! configuration file selection, and logging verbosity.

use clap::{Parser, Subcommand};

use blockctx::node::NodeRef;

/// Command-line arguments for the blockctx tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the document (TOML)
    #[arg(help = "Path to the document file")]
    pub document: String,

    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the statements in effect at a node
    Resolve(NodeArgs),

    /// Evaluate the context at a node and print every variable
    Evaluate(NodeArgs),

    /// Evaluate the context of every node, stopping at the first script error
    Check,

    /// Open a block's mask, optionally resize it, and print it
    Mask {
        #[command(flatten)]
        node: NodeArgs,

        /// Grow or shrink the mask to this many rows
        #[arg(long)]
        rows: Option<usize>,

        /// Replace the mask title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print a node's encoded mask data as TOML
    Wire(NodeArgs),
}

/// Selects one node of the document.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct NodeArgs {
    /// Block identifier
    #[arg(short, long, conflicts_with = "diagram")]
    pub block: Option<u64>,

    /// Diagram identifier, used when no block is given
    #[arg(short, long, default_value_t = 1)]
    pub diagram: u64,
}

impl NodeArgs {
    pub fn node(&self) -> NodeRef {
        match self.block {
            Some(id) => NodeRef::block(id),
            None => NodeRef::diagram(self.diagram),
        }
    }
}
