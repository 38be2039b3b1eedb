//! Page-level types.

use serde::{Deserialize, Serialize};

use super::TextSpan;

/// A parsed page: its size and the spans of its content stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Text spans in content-stream order
    pub spans: Vec<TextSpan>,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            spans: Vec::new(),
        }
    }

    /// Create a US Letter page (612 x 792 points).
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }

    /// Append a span.
    pub fn add_span(&mut self, span: TextSpan) {
        self.spans.push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_page() {
        let mut page = Page::letter(3);
        page.add_span(TextSpan::styled("Hello", 12.0, false, false));
        assert_eq!((page.number, page.width, page.height), (3, 612.0, 792.0));
        assert_eq!(page.spans.len(), 1);
    }
}
