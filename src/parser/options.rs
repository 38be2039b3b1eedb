//! Parsing options and configuration.

use crate::render::PageSelection;

/// Options for parsing PDF documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Page selection (which pages to parse)
    pub pages: PageSelection,

    /// Whether to collect image XObjects from the selected pages
    pub extract_images: bool,

    /// Whether to read the accessibility structure tree
    pub extract_structure: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable structure tree extraction.
    pub fn with_structure(mut self, extract: bool) -> Self {
        self.extract_structure = extract;
        self
    }

    /// Text spans only: no images, no structure tree.
    pub fn text_only(self) -> Self {
        self.with_images(false).with_structure(false)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            pages: PageSelection::All,
            extract_images: true,
            extract_structure: true,
        }
    }
}

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .text_only()
            .with_pages(PageSelection::Pages(vec![2]));

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(!options.extract_images);
        assert!(!options.extract_structure);
        assert!(options.pages.includes(2));
        assert!(!options.pages.includes(1));
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.extract_images);
        assert!(options.extract_structure);
    }
}
