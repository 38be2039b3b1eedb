//! # pdftag
//!
//! Accessibility tagging for PDF documents.
//!
//! The library reads a PDF's styled text spans, classifies them as headings,
//! subheadings, paragraphs and list items, serializes the document's own
//! structure tree (when it has one), and asks a hosted multimodal model to
//! build a tag tree and describe images.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdftag::{parse_file, tagging, render};
//!
//! fn main() -> pdftag::Result<()> {
//!     // Parse a PDF file
//!     let doc = parse_file("document.pdf")?;
//!
//!     // Classify spans, offline
//!     let pages = tagging::tag_document(&doc, &tagging::ClassifierPolicy::default());
//!
//!     // Render as Markdown
//!     let markdown = render::to_markdown(&pages, &doc.metadata, &render::RenderOptions::default());
//!     println!("{}", markdown);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## With the model
//!
//! ```no_run
//! use pdftag::{parse_file, Config, MistralClient, Tagger, MemoryStore};
//!
//! fn main() -> pdftag::Result<()> {
//!     let config = Config::from_env()?;
//!     let tagger = Tagger::new(Box::new(MistralClient::new(&config)?));
//!
//!     let doc = parse_file("document.pdf")?;
//!     let report = tagger.tag_document(&doc)?;
//!
//!     let mut store = MemoryStore::new();
//!     Tagger::write_artifacts(&report, &mut store)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Span classification**: font size and weight heuristics, configurable thresholds
//! - **Structure tree dump**: indented ASCII form of `/StructTreeRoot`
//! - **Model integration**: tag trees and image descriptions as JSON
//! - **Output**: Markdown, JSON, Graphviz DOT, written through an artifact store

pub mod ai;
pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod storage;
pub mod tagging;

// Re-export commonly used types
pub use ai::{extract_json, ChatClient, ImageInput, MistralClient, ResponseError, ResponseErrorKind};
pub use config::Config;
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    Document, ElementType, Metadata, Page, PageImage, StructKids, StructNode, TaggedElement,
    TaggedPage, TextSpan,
};
pub use parser::{ErrorMode, ParseOptions, PdfParser};
pub use pipeline::{AiFailure, ImageReport, StructureReport, TagOptions, TagReport, Tagger};
pub use render::{JsonFormat, PageSelection, RenderOptions};
pub use storage::{ArtifactStore, DirStore, MemoryStore};
pub use tagging::{classify_span, serialize_structure, ClassifierPolicy};

use std::io::Read;
use std::path::Path;

/// Parse a PDF file and return a structured document.
///
/// # Example
///
/// ```no_run
/// use pdftag::parse_file;
///
/// let doc = parse_file("document.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let parser = PdfParser::open(path)?;
    parser.parse()
}

/// Parse a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdftag::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().lenient().text_only();
/// let doc = parse_file_with_options("document.pdf", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let parser = PdfParser::open_with_options(path, options)?;
    parser.parse()
}

/// Parse a PDF from bytes, e.g. an upload.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    let parser = PdfParser::from_bytes(data)?;
    parser.parse()
}

/// Parse a PDF from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    let parser = PdfParser::from_bytes_with_options(data, options)?;
    parser.parse()
}

/// Parse a PDF from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    let parser = PdfParser::from_reader(reader)?;
    parser.parse()
}

/// Classify the spans of a PDF file with the default policy.
///
/// # Example
///
/// ```no_run
/// let pages = pdftag::tag_elements("document.pdf").unwrap();
/// for page in &pages {
///     println!("page {}: {} elements", page.page_number, page.elements.len());
/// }
/// ```
pub fn tag_elements<P: AsRef<Path>>(path: P) -> Result<Vec<TaggedPage>> {
    let doc = parse_file_with_options(path, ParseOptions::new().text_only())?;
    Ok(tagging::tag_document(&doc, &ClassifierPolicy::default()))
}

/// Serialize the structure tree of a PDF file as indented ASCII.
///
/// Untagged files yield the "No structure tree found" message.
pub fn structure_ascii<P: AsRef<Path>>(path: P) -> Result<String> {
    let options = ParseOptions::new()
        .with_images(false)
        .with_pages(PageSelection::Pages(Vec::new()));
    let doc = parse_file_with_options(path, options)?;
    Ok(match &doc.structure {
        Some(root) => serialize_structure(root, 0),
        None => tagging::NO_STRUCTURE_TREE.to_string(),
    })
}

/// Builder for parsing and tagging PDF documents offline.
///
/// # Example
///
/// ```no_run
/// use pdftag::{PdfTag, PageSelection};
///
/// let markdown = PdfTag::new()
///     .with_heading_size(16.0)
///     .with_pages(PageSelection::Range(1..=3))
///     .with_frontmatter()
///     .lenient()
///     .parse("document.pdf")?
///     .to_markdown();
/// # Ok::<(), pdftag::Error>(())
/// ```
pub struct PdfTag {
    parse_options: ParseOptions,
    render_options: RenderOptions,
    policy: ClassifierPolicy,
}

impl PdfTag {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            render_options: RenderOptions::default(),
            policy: ClassifierPolicy::default(),
        }
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.parse_options = self.parse_options.with_images(extract);
        self
    }

    /// Enable frontmatter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.render_options = self.render_options.with_frontmatter(true);
        self
    }

    /// Set the heading size threshold.
    pub fn with_heading_size(mut self, size: f32) -> Self {
        self.policy = self.policy.with_heading_size(size);
        self
    }

    /// Set the subheading size threshold.
    pub fn with_subheading_size(mut self, size: f32) -> Self {
        self.policy = self.policy.with_subheading_size(size);
        self
    }

    /// Replace the classifier policy.
    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse_options = self.parse_options.with_pages(pages.clone());
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Parse and classify a PDF file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<PdfTagResult> {
        let parser = PdfParser::open_with_options(path, self.parse_options.clone())?;
        self.finish(parser)
    }

    /// Parse and classify a PDF from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<PdfTagResult> {
        let parser = PdfParser::from_bytes_with_options(data, self.parse_options.clone())?;
        self.finish(parser)
    }

    fn finish(self, parser: PdfParser) -> Result<PdfTagResult> {
        let document = parser.parse()?;
        let pages = tagging::tag_document(&document, &self.policy);
        Ok(PdfTagResult {
            document,
            pages,
            render_options: self.render_options,
        })
    }
}

impl Default for PdfTag {
    fn default() -> Self {
        Self::new()
    }
}

/// A parsed and classified document.
pub struct PdfTagResult {
    /// The parsed document
    pub document: Document,
    /// Classified pages
    pub pages: Vec<TaggedPage>,
    render_options: RenderOptions,
}

impl PdfTagResult {
    /// Convert the tagged pages to Markdown.
    pub fn to_markdown(&self) -> String {
        render::to_markdown(&self.pages, &self.document.metadata, &self.render_options)
    }

    /// Convert the tagged pages to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.pages, format)
    }

    /// The structure tree as indented ASCII.
    pub fn structure_ascii(&self) -> String {
        match &self.document.structure {
            Some(root) => serialize_structure(root, 0),
            None => tagging::NO_STRUCTURE_TREE.to_string(),
        }
    }

    /// The tag-tree prompt for these pages.
    pub fn prompt(&self) -> Result<String> {
        ai::tag_tree_prompt(&self.pages)
    }
}
