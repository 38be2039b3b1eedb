//! Document-level types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Page, PageImage, StructNode};

/// A parsed PDF document, ready for tagging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Selected pages in page order
    pub pages: Vec<Page>,

    /// Images of the selected pages, page order then resource order
    pub images: Vec<PageImage>,

    /// Root of the accessibility structure tree, if the PDF is tagged
    pub structure: Option<StructNode>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages held by the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Images found on a page.
    pub fn images_on_page(&self, page_number: u32) -> impl Iterator<Item = &PageImage> {
        self.images
            .iter()
            .filter(move |img| img.page_number == page_number)
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the file
    pub page_count: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,

    /// Whether the catalog carries a structure tree
    pub tagged: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }

    /// Render the metadata as a YAML frontmatter block.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("creator", &self.creator),
            ("producer", &self.producer),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                lines.push(format!("{}: \"{}\"", key, escape_yaml(value)));
            }
        }
        if let Some(ref created) = self.created {
            lines.push(format!("created: {}", created.to_rfc3339()));
        }
        if let Some(ref modified) = self.modified {
            lines.push(format!("modified: {}", modified.to_rfc3339()));
        }

        lines.push(format!("pdf_version: \"{}\"", self.pdf_version));
        lines.push(format!("pages: {}", self.page_count));
        lines.push(format!("tagged: {}", self.tagged));
        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
