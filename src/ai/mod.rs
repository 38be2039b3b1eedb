//! Talking to the hosted model: client, prompts, and answer parsing.

mod client;
mod extract;
mod prompt;

pub use client::{query_json, ChatClient, ImageInput, MistralClient};
pub use extract::{extract_json, ResponseError, ResponseErrorKind};
pub use prompt::{
    ai_input_json, structure_cleanup_prompt, tag_tree_prompt, IMAGE_PROMPT,
    STRUCTURE_CLEANUP_INSTRUCTIONS, TAG_TREE_INSTRUCTIONS,
};
