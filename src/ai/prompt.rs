//! Prompt text sent to the model.

use crate::error::Result;
use crate::model::TaggedPage;

/// Instruction for building the tag tree.
pub const TAG_TREE_INSTRUCTIONS: &str = "Analyze the following document content and generate a tag tree that identifies headings, \
subheadings, and paragraphs. The tag tree should be in JSON format with a hierarchical structure, \
where each heading can have subheadings or paragraphs as children. \
Each node has a \"type\", a \"content\" and a \"children\" field. \
Return only the JSON without any additional text. Use code fences for the JSON.";

/// Instruction sent along with a page's images.
pub const IMAGE_PROMPT: &str = "Provide a detailed description of the following images for accessibility tagging. \
Return only the JSON without any additional text. Use code fences for the JSON.";

/// Instruction for tidying a serialized structure tree.
pub const STRUCTURE_CLEANUP_INSTRUCTIONS: &str = "The following is an ASCII rendering of a PDF accessibility structure tree. \
Clean it up for a human reader: keep the hierarchy and the tag names, merge fragmented content, \
and flag elements that look mistagged. Return only the cleaned tree as plain text.";

/// The AI input structure as pretty-printed JSON.
pub fn ai_input_json(pages: &[TaggedPage]) -> Result<String> {
    Ok(serde_json::to_string_pretty(pages)?)
}

/// The full tag-tree prompt: instructions, then the document content.
pub fn tag_tree_prompt(pages: &[TaggedPage]) -> Result<String> {
    Ok(format!(
        "{}\n\nDocument Content:\n{}",
        TAG_TREE_INSTRUCTIONS,
        ai_input_json(pages)?
    ))
}

/// The structure-cleanup prompt for an ASCII tree.
pub fn structure_cleanup_prompt(ascii_tree: &str) -> String {
    format!("{}\n\n{}", STRUCTURE_CLEANUP_INSTRUCTIONS, ascii_tree)
}
