//! Tagged elements: the classifier's output.

use serde::{Deserialize, Serialize};

/// Semantic role assigned to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// Large, bold text
    Heading,
    /// Large text
    Subheading,
    /// Body text
    Paragraph,
    /// Bulleted or dashed item
    ListItem,
}

impl ElementType {
    /// The wire name used in JSON and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Heading => "heading",
            ElementType::Subheading => "subheading",
            ElementType::Paragraph => "paragraph",
            ElementType::ListItem => "list_item",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A span after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedElement {
    /// Assigned role
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Trimmed content (list markers stripped)
    pub content: String,
    /// Font size of the source span
    pub font_size: f32,
    /// Bold flag of the source span
    pub bold: bool,
    /// Italic flag of the source span
    pub italic: bool,
}

/// Tagged elements of one page, in content-stream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedPage {
    /// 1-based page number
    pub page_number: u32,
    /// Elements in reading order
    pub elements: Vec<TaggedElement>,
}

impl TaggedPage {
    /// Create an empty tagged page.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            elements: Vec::new(),
        }
    }

    /// Number of elements of the given type.
    pub fn count(&self, element_type: ElementType) -> usize {
        self.elements
            .iter()
            .filter(|e| e.element_type == element_type)
            .count()
    }

    /// Check if the page produced no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_json_shape() {
        let element = TaggedElement {
            element_type: ElementType::ListItem,
            content: "item".to_string(),
            font_size: 11.0,
            bold: false,
            italic: true,
        };

        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "list_item");
        assert_eq!(value["content"], "item");
        assert_eq!(value["font_size"], 11.0);
        assert_eq!(value["bold"], false);
        assert_eq!(value["italic"], true);
    }

    #[test]
    fn test_page_counts() {
        let mut page = TaggedPage::new(2);
        assert!(page.is_empty());
        for element_type in [ElementType::Heading, ElementType::Paragraph, ElementType::Paragraph] {
            page.elements.push(TaggedElement {
                element_type,
                content: "x".to_string(),
                font_size: 12.0,
                bold: false,
                italic: false,
            });
        }
        assert_eq!(page.count(ElementType::Paragraph), 2);
        assert_eq!(page.count(ElementType::ListItem), 0);
        assert_eq!(ElementType::Subheading.to_string(), "subheading");
    }
}
