//! Span classification from font size and weight.

use crate::model::{Document, ElementType, TaggedElement, TaggedPage, TextSpan};

/// Private-use bullet emitted by Symbol-font bullets.
pub const SYMBOL_BULLET: char = '\u{F0B7}';

/// Thresholds and markers used to classify spans.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierPolicy {
    /// Minimum font size for a heading
    pub heading_min_size: f32,

    /// Minimum font size for a subheading
    pub subheading_min_size: f32,

    /// Whether headings must also be bold
    pub heading_requires_bold: bool,

    /// Leading characters that mark a list item
    pub bullet_markers: Vec<char>,
}

impl ClassifierPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heading threshold.
    pub fn with_heading_size(mut self, size: f32) -> Self {
        self.heading_min_size = size;
        self
    }

    /// Set the subheading threshold.
    pub fn with_subheading_size(mut self, size: f32) -> Self {
        self.subheading_min_size = size;
        self
    }

    /// Require (or stop requiring) bold for headings.
    pub fn with_heading_bold(mut self, required: bool) -> Self {
        self.heading_requires_bold = required;
        self
    }

    /// Replace the list markers.
    pub fn with_bullet_markers(mut self, markers: impl IntoIterator<Item = char>) -> Self {
        self.bullet_markers = markers.into_iter().collect();
        self
    }

    /// Strip a leading list marker and the whitespace after it.
    fn strip_marker<'a>(&self, text: &'a str) -> Option<&'a str> {
        let first = text.chars().next()?;
        if !self.bullet_markers.contains(&first) {
            return None;
        }
        Some(text[first.len_utf8()..].trim_start())
    }
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            heading_min_size: 18.0,
            subheading_min_size: 14.0,
            heading_requires_bold: true,
            bullet_markers: vec![SYMBOL_BULLET, '\u{2022}', '-', '*'],
        }
    }
}

/// Classify one span. Whitespace-only spans produce no element.
pub fn classify_span(span: &TextSpan, policy: &ClassifierPolicy) -> Option<TaggedElement> {
    if span.is_blank() {
        return None;
    }
    let text = span.text.trim();

    let (element_type, content) = match policy.strip_marker(text) {
        Some(rest) => (ElementType::ListItem, rest),
        None if span.font_size >= policy.heading_min_size
            && (span.bold || !policy.heading_requires_bold) =>
        {
            (ElementType::Heading, text)
        }
        None if span.font_size >= policy.subheading_min_size => (ElementType::Subheading, text),
        None => (ElementType::Paragraph, text),
    };

    Some(TaggedElement {
        element_type,
        content: content.to_string(),
        font_size: span.font_size,
        bold: span.bold,
        italic: span.italic,
    })
}

/// Classify the spans of one page, in order.
pub fn tag_page(page_number: u32, spans: &[TextSpan], policy: &ClassifierPolicy) -> TaggedPage {
    let elements: Vec<TaggedElement> = spans
        .iter()
        .filter_map(|span| classify_span(span, policy))
        .collect();

    log::debug!(
        "Page {}: {} of {} spans tagged",
        page_number,
        elements.len(),
        spans.len()
    );

    TaggedPage {
        page_number,
        elements,
    }
}

/// Classify every page of a document. Pages without text yield empty pages.
pub fn tag_document(doc: &Document, policy: &ClassifierPolicy) -> Vec<TaggedPage> {
    doc.pages
        .iter()
        .map(|page| tag_page(page.number, &page.spans, policy))
        .collect()
}
