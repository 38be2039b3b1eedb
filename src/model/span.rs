//! Styled text runs as they come out of a page's content stream.

use serde::{Deserialize, Serialize};

/// A run of text sharing one font size and style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content, untrimmed
    pub text: String,
    /// X position (left edge, text space)
    pub x: f32,
    /// Y position (baseline, text space)
    pub y: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub bold: bool,
    /// Whether the font appears to be italic
    pub italic: bool,
}

impl TextSpan {
    /// Create a span positioned at `(x, y)`, deriving style flags from the font name.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32, font_name: &str) -> Self {
        let lower = font_name.to_lowercase();
        let bold = ["bold", "black", "heavy", "semibold"]
            .iter()
            .any(|w| lower.contains(w));
        let italic = lower.contains("italic") || lower.contains("oblique");

        Self {
            text: text.into(),
            x,
            y,
            font_size,
            font_name: font_name.to_string(),
            bold,
            italic,
        }
    }

    /// Create an unpositioned span with explicit style flags.
    pub fn styled(text: impl Into<String>, font_size: f32, bold: bool, italic: bool) -> Self {
        Self {
            text: text.into(),
            x: 0.0,
            y: 0.0,
            font_size,
            font_name: String::new(),
            bold,
            italic,
        }
    }

    /// Whether the span carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
