//! Rendering tagged output to Markdown, JSON and Graphviz DOT.

mod dot;
mod json;
mod markdown;
mod options;

pub use dot::{fill_color, to_dot};
pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{PageSelection, RenderOptions};
