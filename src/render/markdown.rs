//! Markdown rendering of tagged pages.

use crate::model::{ElementType, Metadata, TaggedElement, TaggedPage};

use super::RenderOptions;

/// Convert tagged pages to Markdown.
pub fn to_markdown(pages: &[TaggedPage], metadata: &Metadata, options: &RenderOptions) -> String {
    MarkdownRenderer::new(options.clone()).render(pages, metadata)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render tagged pages, with frontmatter when enabled.
    pub fn render(&self, pages: &[TaggedPage], metadata: &Metadata) -> String {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&metadata.to_yaml_frontmatter());
            output.push('\n');
        }

        for page in pages {
            if self.options.page_selection.includes(page.page_number) {
                self.render_page(&mut output, page);
            }
        }

        let trimmed = output.trim_end();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}\n", trimmed)
        }
    }

    fn render_page(&self, output: &mut String, page: &TaggedPage) {
        if self.options.page_markers {
            output.push_str(&format!("<!-- page {} -->\n\n", page.page_number));
        }

        let mut previous: Option<ElementType> = None;
        for element in &page.elements {
            // Consecutive list items form one list.
            if previous == Some(ElementType::ListItem) && element.element_type != ElementType::ListItem {
                output.push('\n');
            }
            self.render_element(output, element);
            previous = Some(element.element_type);
        }
        if previous == Some(ElementType::ListItem) {
            output.push('\n');
        }
    }

    fn render_element(&self, output: &mut String, element: &TaggedElement) {
        let text = escape_markdown(&element.content);
        match element.element_type {
            ElementType::Heading => {
                output.push_str("# ");
                output.push_str(&text);
                output.push_str("\n\n");
            }
            ElementType::Subheading => {
                output.push_str("## ");
                output.push_str(&text);
                output.push_str("\n\n");
            }
            ElementType::ListItem => {
                output.push(self.options.list_marker);
                output.push(' ');
                output.push_str(&text);
                output.push('\n');
            }
            ElementType::Paragraph => {
                output.push_str(&emphasize(&text, element.bold, element.italic));
                output.push_str("\n\n");
            }
        }
    }
}

fn emphasize(text: &str, bold: bool, italic: bool) -> String {
    match (bold, italic) {
        (true, true) => format!("***{}***", text),
        (true, false) => format!("**{}**", text),
        (false, true) => format!("*{}*", text),
        (false, false) => text.to_string(),
    }
}

fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        let marker = block_marker(line);
        for (at, c) in line.char_indices() {
            if marker == Some(at) {
                result.push('\\');
            }
            match c {
                '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                    result.push('\\');
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
    }
    result
}

/// Byte offset of the character that would make `line` a heading, quote or
/// list item (`# x`, `> x`, `- x`, `+ x`, `1. x`, `1) x`).
fn block_marker(line: &str) -> Option<usize> {
    let ends_marker = |rest: &str| rest.is_empty() || rest.starts_with(' ');
    match line.chars().next()? {
        '#' | '>' => Some(0),
        '-' | '+' if ends_marker(&line[1..]) => Some(0),
        c if c.is_ascii_digit() => {
            let digits = line.bytes().take_while(u8::is_ascii_digit).count();
            let rest = &line[digits..];
            let ordered = digits <= 9
                && (rest.starts_with('.') || rest.starts_with(')'))
                && ends_marker(&rest[1..]);
            ordered.then_some(digits)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PageSelection;

    fn element(element_type: ElementType, content: &str) -> TaggedElement {
        TaggedElement {
            element_type,
            content: content.to_string(),
            font_size: 12.0,
            bold: false,
            italic: false,
        }
    }

    fn sample() -> Vec<TaggedPage> {
        let mut first = TaggedPage::new(1);
        first.elements = vec![
            element(ElementType::Heading, "Annual Report"),
            element(ElementType::Subheading, "Overview"),
            element(ElementType::ListItem, "first"),
            element(ElementType::ListItem, "second"),
            element(ElementType::Paragraph, "Body with *stars*"),
        ];
        let mut second = TaggedPage::new(2);
        second.elements = vec![element(ElementType::Paragraph, "Closing")];
        vec![first, second]
    }

    #[test]
    fn test_render_elements() {
        let md = to_markdown(&sample(), &Metadata::default(), &RenderOptions::default());
        assert_eq!(
            md,
            "# Annual Report\n\n## Overview\n\n- first\n- second\n\nBody with \\*stars\\*\n\nClosing\n"
        );
    }

    #[test]
    fn test_list_marker_and_pages() {
        let options = RenderOptions::new()
            .with_list_marker('*')
            .with_pages(PageSelection::Pages(vec![1]));
        let md = to_markdown(&sample(), &Metadata::default(), &options);
        assert!(md.contains("* first\n* second\n"));
        assert!(!md.contains("Closing"));
    }

    #[test]
    fn test_frontmatter_and_markers() {
        let mut metadata = Metadata::with_version("1.7");
        metadata.title = Some("Report".to_string());
        let options = RenderOptions::new()
            .with_frontmatter(true)
            .with_page_markers(true);

        let md = to_markdown(&sample(), &metadata, &options);
        assert!(md.starts_with("---\ntitle: \"Report\""));
        assert!(md.contains("<!-- page 2 -->\n\nClosing"));
    }

    #[test]
    fn test_paragraph_emphasis() {
        let mut page = TaggedPage::new(1);
        let mut bold = element(ElementType::Paragraph, "Note");
        bold.bold = true;
        page.elements.push(bold);

        let md = to_markdown(&[page], &Metadata::default(), &RenderOptions::default());
        assert_eq!(md, "**Note**\n");
    }

    #[test]
    fn test_block_markers_escaped() {
        let mut page = TaggedPage::new(1);
        page.elements = vec![
            element(ElementType::Paragraph, "# 1 priority"),
            element(ElementType::Paragraph, "1. Introduction"),
            element(ElementType::Paragraph, "> quoted"),
            element(ElementType::ListItem, "- nested"),
        ];
        let md = to_markdown(&[page], &Metadata::default(), &RenderOptions::default());
        assert_eq!(
            md,
            "\\# 1 priority\n\n1\\. Introduction\n\n\\> quoted\n\n- \\- nested\n"
        );
    }

    #[test]
    fn test_plain_line_starts_untouched() {
        for text in ["2024 results", "3.5 million", "-5 degrees", "+1 vote", "1234567890. x"] {
            assert_eq!(escape_markdown(text), text);
        }
        assert_eq!(escape_markdown("a\n2) b"), "a\n2\\) b");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            to_markdown(&[], &Metadata::default(), &RenderOptions::default()),
            ""
        );
    }
}
