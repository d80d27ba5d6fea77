//! blockctx Core Types and Definitions
//!
//! This crate provides the foundational, I/O-free types shared by the blockctx
//! crates. It includes:
//!
//! - **Nodes**: Addresses of blocks and diagrams in a document ([`node`] module)
//! - **Wire values**: The typed nested-list model masks are stored as ([`wire`] module)
//! - **Masks**: Mask documents and their wire codec ([`mask`] module)
//! - **Errors**: Shape errors raised while decoding wire data ([`error`] module)

pub mod error;
pub mod mask;
pub mod node;
pub mod wire;

pub use error::ShapeError;
