//! Document model types.
//!
//! The parser fills these from a PDF; the tagging and rendering modules only
//! ever read them.

mod document;
mod element;
mod image;
mod page;
mod span;
mod structure;

pub use document::{Document, Metadata};
pub use element::{ElementType, TaggedElement, TaggedPage};
pub use image::PageImage;
pub use page::Page;
pub use span::TextSpan;
pub use structure::{StructKids, StructNode};
