//! PDF parsing module.
//!
//! Everything that touches `lopdf` lives here; the rest of the crate works on
//! the owned [`crate::model`] types.

mod content;
mod images;
mod options;
mod pdf_parser;
mod structure;

pub use content::SpanExtractor;
pub use images::page_images;
pub use options::{ErrorMode, ParseOptions};
pub use pdf_parser::PdfParser;
pub use structure::{has_structure_tree, read_structure_tree, MAX_STRUCTURE_DEPTH};
