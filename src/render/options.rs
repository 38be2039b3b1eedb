//! Rendering options and page selection.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for rendering tagged pages.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Include YAML frontmatter with metadata
    pub include_frontmatter: bool,

    /// Character to use for list item markers
    pub list_marker: char,

    /// Page selection
    pub page_selection: PageSelection,

    /// Emit a `<!-- page N -->` marker before each page
    pub page_markers: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Enable or disable page markers.
    pub fn with_page_markers(mut self, markers: bool) -> Self {
        self.page_markers = markers;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_frontmatter: false,
            list_marker: '-',
            page_selection: PageSelection::All,
            page_markers: false,
        }
    }
}

/// Page selection for parsing and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed, sorted, deduplicated)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    ///
    /// A comma list expands to individual pages and may name at most
    /// [`MAX_LISTED_PAGES`] of them; a lone range has no such limit.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let start = parse_page(start).ok_or_else(invalid)?;
                let end = parse_page(end).ok_or_else(invalid)?;
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page(start).ok_or_else(invalid)?;
                    let end = parse_page(end).ok_or_else(invalid)?;
                    if start > end {
                        return Err(invalid());
                    }
                    if (end - start) as usize >= MAX_LISTED_PAGES.saturating_sub(pages.len()) {
                        return Err(invalid());
                    }
                    pages.extend(start..=end);
                }
                None => pages.push(parse_page(part).ok_or_else(invalid)?),
            }
            if pages.len() > MAX_LISTED_PAGES {
                return Err(invalid());
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

/// Upper bound on the pages a comma-separated selection expands to.
pub const MAX_LISTED_PAGES: usize = 100_000;

// Pages are 1-indexed; zero is rejected.
fn parse_page(s: &str) -> Option<u32> {
    s.trim().parse().ok().filter(|&p| p > 0)
}
