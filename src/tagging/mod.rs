//! Offline tagging: span classification and structure-tree serialization.
//!
//! Both halves are pure functions over the [`crate::model`] types; nothing
//! here performs I/O.

mod ascii;
mod classify;

pub use ascii::{serialize_structure, wrap, CONTENT_WIDTH, NO_STRUCTURE_TREE, UNKNOWN_TAG};
pub use classify::{classify_span, tag_document, tag_page, ClassifierPolicy, SYMBOL_BULLET};
