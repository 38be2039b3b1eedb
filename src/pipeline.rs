//! One document, end to end: classify, ask the model, collect the results.
//!
//! Model failures never abort a run. Each request's outcome is kept in the
//! [`TagReport`] as a `Result<_, AiFailure>`, so a broken image description
//! still leaves the tag tree and the structure dump intact.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::{query_json, structure_cleanup_prompt, tag_tree_prompt, ChatClient, ImageInput, IMAGE_PROMPT};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, TaggedPage};
use crate::render::{to_dot, to_json, to_markdown, JsonFormat, RenderOptions};
use crate::storage::ArtifactStore;
use crate::tagging::{serialize_structure, tag_document, ClassifierPolicy, NO_STRUCTURE_TREE};

/// Reported when the model's answer parses but carries nothing.
pub const EMPTY_RESPONSE: &str = "Received empty response from AI.";

/// Reported when an image request comes back empty.
pub const EMPTY_IMAGE_RESPONSE: &str = "Received empty response from AI for image descriptions.";

/// Reported when none of a page's images can be sent.
pub const NO_SENDABLE_IMAGES: &str = "No images in a format the model accepts.";

/// A failed model request, in a form fit to show a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiFailure {
    /// Short description
    pub error: String,
    /// Parser or transport diagnostic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// The model's unparsed answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AiFailure {
    /// A failure with only a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            raw_response: None,
        }
    }
}

impl From<&Error> for AiFailure {
    fn from(err: &Error) -> Self {
        match err {
            Error::MalformedResponse(e) => Self {
                error: e.to_string(),
                details: Some(e.details.clone()),
                raw_response: Some(e.raw_response.clone()),
            },
            Error::Api { .. } => Self::new(err.to_string()),
            other => Self::new(format!("Error: {}", other)),
        }
    }
}

impl std::fmt::Display for AiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.error)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Which model requests a run makes besides the tag tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOptions {
    /// Ask for a description of each page's images
    pub describe_images: bool,
    /// Serialize the structure tree
    pub describe_structure: bool,
    /// Send the serialized structure tree to the model for cleanup
    pub cleanup_structure: bool,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            describe_images: true,
            describe_structure: true,
            cleanup_structure: false,
        }
    }
}

/// Image descriptions for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    /// 1-based page number
    pub page_number: u32,
    /// Images found on the page
    pub image_count: usize,
    /// The model's description, or why there is none
    pub descriptions: std::result::Result<Value, AiFailure>,
}

/// The serialized structure tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    /// ASCII rendering, or the no-tree message
    pub ascii: String,
    /// Model cleanup, when requested and a tree exists
    pub cleaned: Option<std::result::Result<String, AiFailure>>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct TagReport {
    /// Metadata of the source document
    pub metadata: Metadata,
    /// Tagged pages (the AI input structure)
    pub pages: Vec<TaggedPage>,
    /// The tag-tree prompt as sent
    pub prompt: String,
    /// The model's tag tree
    pub tag_tree: std::result::Result<Value, AiFailure>,
    /// Image descriptions for pages with images
    pub images: Vec<ImageReport>,
    /// Structure tree dump, when requested
    pub structure: Option<StructureReport>,
}

impl TagReport {
    /// All failed model requests, in request order.
    pub fn failures(&self) -> Vec<&AiFailure> {
        let mut failures: Vec<&AiFailure> = self.tag_tree.as_ref().err().into_iter().collect();
        failures.extend(self.images.iter().filter_map(|img| img.descriptions.as_ref().err()));
        if let Some(Some(Err(f))) = self.structure.as_ref().map(|s| s.cleaned.as_ref()) {
            failures.push(f);
        }
        failures
    }
}

/// Runs the tagging pipeline against one model.
pub struct Tagger {
    client: Box<dyn ChatClient>,
    policy: ClassifierPolicy,
    options: TagOptions,
}

impl Tagger {
    /// Create a tagger with the default policy and options.
    pub fn new(client: Box<dyn ChatClient>) -> Self {
        Self {
            client,
            policy: ClassifierPolicy::default(),
            options: TagOptions::default(),
        }
    }

    /// Set the classifier policy.
    pub fn with_policy(mut self, policy: ClassifierPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the run options.
    pub fn with_options(mut self, options: TagOptions) -> Self {
        self.options = options;
        self
    }

    /// The classifier policy in use.
    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    /// Tag a parsed document.
    ///
    /// Fails only if the prompt cannot be built; model failures are recorded
    /// in the report.
    pub fn tag_document(&self, doc: &Document) -> Result<TagReport> {
        let pages = tag_document(doc, &self.policy);
        let prompt = tag_tree_prompt(&pages)?;

        log::info!("Requesting tag tree for {} page(s)", pages.len());
        let tag_tree = self.request_json(&prompt, &[], EMPTY_RESPONSE);

        let images = if self.options.describe_images {
            self.describe_images(doc)
        } else {
            Vec::new()
        };

        let structure = self
            .options
            .describe_structure
            .then(|| self.describe_structure(doc));

        Ok(TagReport {
            metadata: doc.metadata.clone(),
            pages,
            prompt,
            tag_tree,
            images,
            structure,
        })
    }

    /// Describe the images of every page that has any.
    pub fn describe_images(&self, doc: &Document) -> Vec<ImageReport> {
        let mut reports = Vec::new();

        for page in &doc.pages {
            let images: Vec<_> = doc.images_on_page(page.number).collect();
            if images.is_empty() {
                continue;
            }
            log::info!("Page {} has {} image(s).", page.number, images.len());

            let inputs: Vec<ImageInput> = images
                .iter()
                .filter(|img| {
                    if !img.is_encoded() {
                        log::warn!(
                            "Not sending image {} on page {}: unsupported format ({})",
                            img.name,
                            page.number,
                            img.mime_type
                        );
                    }
                    img.is_encoded()
                })
                .map(|img| ImageInput::from(*img))
                .collect();

            let descriptions = if inputs.is_empty() {
                Err(AiFailure::new(NO_SENDABLE_IMAGES))
            } else {
                self.request_json(IMAGE_PROMPT, &inputs, EMPTY_IMAGE_RESPONSE)
            };

            reports.push(ImageReport {
                page_number: page.number,
                image_count: images.len(),
                descriptions,
            });
        }

        reports
    }

    /// Serialize the structure tree, cleaning it up through the model when
    /// configured.
    pub fn describe_structure(&self, doc: &Document) -> StructureReport {
        let Some(root) = &doc.structure else {
            return StructureReport {
                ascii: NO_STRUCTURE_TREE.to_string(),
                cleaned: None,
            };
        };

        let ascii = serialize_structure(root, 0);
        let cleaned = self
            .options
            .cleanup_structure
            .then(|| self.cleanup_structure(&ascii));

        StructureReport { ascii, cleaned }
    }

    /// Ask the model to tidy an ASCII structure tree.
    pub fn cleanup_structure(&self, ascii: &str) -> std::result::Result<String, AiFailure> {
        log::info!("Requesting structure cleanup");
        match self.client.complete(&structure_cleanup_prompt(ascii), &[]) {
            Ok(text) if text.trim().is_empty() => {
                log::error!("{}", EMPTY_RESPONSE);
                Err(AiFailure::new(EMPTY_RESPONSE))
            }
            Ok(text) => Ok(text),
            Err(e) => {
                log::error!("AI Error: {}", e);
                Err(AiFailure::from(&e))
            }
        }
    }

    fn request_json(
        &self,
        prompt: &str,
        images: &[ImageInput],
        empty_message: &str,
    ) -> std::result::Result<Value, AiFailure> {
        match query_json(&*self.client, prompt, images) {
            Ok(value) if is_empty(&value) => {
                log::error!("{}", empty_message);
                Err(AiFailure::new(empty_message))
            }
            Ok(value) => Ok(value),
            Err(e) => {
                log::error!("AI Error: {}", e);
                Err(AiFailure::from(&e))
            }
        }
    }

    /// Write a report's artifacts and return their names.
    ///
    /// Always writes `prompt.txt`, `elements.json`, `extract.md`,
    /// `tag_tree.json` (the failure payload when the request failed) and
    /// `images.json`; `tag_tree.dot` when a tree exists; `images_page<N>.dot`
    /// for image answers shaped like a tag tree; `structure.txt` when the
    /// structure was serialized; `structure_cleaned.txt` when cleanup
    /// succeeded.
    pub fn write_artifacts(report: &TagReport, store: &mut dyn ArtifactStore) -> Result<Vec<String>> {
        let mut written = Vec::new();
        let mut put = |name: &str, bytes: &[u8]| -> Result<()> {
            store.put(name, bytes)?;
            written.push(name.to_string());
            Ok(())
        };

        put("prompt.txt", report.prompt.as_bytes())?;
        put(
            "elements.json",
            to_json(&report.pages, JsonFormat::Pretty)?.as_bytes(),
        )?;

        let markdown = to_markdown(
            &report.pages,
            &report.metadata,
            &RenderOptions::new().with_frontmatter(true),
        );
        put("extract.md", markdown.as_bytes())?;

        put(
            "tag_tree.json",
            to_json(&outcome_value(&report.tag_tree)?, JsonFormat::Pretty)?.as_bytes(),
        )?;
        if let Ok(tree) = &report.tag_tree {
            put("tag_tree.dot", to_dot(tree).as_bytes())?;
        }

        let images = report
            .images
            .iter()
            .map(|img| {
                Ok(serde_json::json!({
                    "page_number": img.page_number,
                    "image_count": img.image_count,
                    "descriptions": outcome_value(&img.descriptions)?,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;
        put("images.json", to_json(&images, JsonFormat::Pretty)?.as_bytes())?;

        // Answers shaped like a tag tree also get a graph.
        for img in &report.images {
            if let Ok(tree) = &img.descriptions {
                if tree.get("children").is_some_and(Value::is_array) {
                    let name = format!("images_page{}.dot", img.page_number);
                    put(&name, to_dot(tree).as_bytes())?;
                }
            }
        }

        if let Some(structure) = &report.structure {
            put("structure.txt", structure.ascii.as_bytes())?;
            if let Some(Ok(cleaned)) = &structure.cleaned {
                put("structure_cleaned.txt", cleaned.as_bytes())?;
            }
        }

        log::debug!("Wrote {} artifacts", written.len());
        Ok(written)
    }
}

/// The value itself, or the failure payload in its place.
fn outcome_value(outcome: &std::result::Result<Value, AiFailure>) -> Result<Value> {
    match outcome {
        Ok(value) => Ok(value.clone()),
        Err(failure) => Ok(serde_json::to_value(failure)?),
    }
}

/// Values an answer cannot usefully be: null, false, zero, empty string, array or object.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
