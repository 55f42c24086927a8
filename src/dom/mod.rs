//! DOM Module - Arena-based mutable document
//!
//! Implements the document the overlay operates on using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for element/attribute names
//! - Ordered inline style declarations

pub mod document;
pub mod node;
pub mod strings;
pub mod style;

pub use document::Document;
pub use node::{Attribute, Node, NodeId, NodeKind, DOCUMENT_NODE};
pub use strings::StringPool;
pub use style::InlineStyle;
