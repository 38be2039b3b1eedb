//! Pulling a JSON value out of a model's free-text answer.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static FENCED_JSON_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn fenced_json_regex() -> Option<&'static Regex> {
    FENCED_JSON_REGEX
        .get_or_init(|| Regex::new(r"(?s)```json\s*(\{.*\})\s*```").ok())
        .as_ref()
}

/// Which parse attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseErrorKind {
    /// A ```json fence was found but its body is not valid JSON
    FencedJson,
    /// No fence; the whole answer is not valid JSON
    BareJson,
}

impl ResponseErrorKind {
    /// User-facing message.
    pub fn message(&self) -> &'static str {
        match self {
            ResponseErrorKind::FencedJson => "Failed to parse extracted JSON.",
            ResponseErrorKind::BareJson => "Failed to parse AI response as JSON.",
        }
    }
}

/// A model answer that did not contain usable JSON.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", .kind.message())]
pub struct ResponseError {
    /// Which parse attempt failed
    pub kind: ResponseErrorKind,
    /// Parser diagnostic
    pub details: String,
    /// The model's answer, unchanged
    pub raw_response: String,
}

/// Extract a JSON value from model output.
///
/// The first ```` ```json ```` fenced block wins; without one the whole text
/// is parsed.
pub fn extract_json(text: &str) -> Result<Value, ResponseError> {
    let fenced = fenced_json_regex()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1));

    let (candidate, kind) = match fenced {
        Some(body) => (body.as_str(), ResponseErrorKind::FencedJson),
        None => (text, ResponseErrorKind::BareJson),
    };

    match serde_json::from_str(candidate) {
        Ok(value) => {
            log::info!("Successfully parsed AI response as JSON.");
            Ok(value)
        }
        Err(e) => {
            log::error!("{}", kind.message());
            Err(ResponseError {
                kind,
                details: e.to_string(),
                raw_response: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json() {
        let text = "Here is the tree:\n```json\n{\"a\": 1}\n```\nLet me know!";
        assert_eq!(extract_json(text).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_bare_json() {
        assert_eq!(extract_json("{\"a\":1}").unwrap(), json!({"a": 1}));
        assert_eq!(extract_json("  [1, 2]\n").unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_fence_spans_nested_braces() {
        let text = "```json\n{\"type\": \"heading\", \"children\": [{\"type\": \"paragraph\"}]}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["children"][0]["type"], "paragraph");
    }

    #[test]
    fn test_invalid_fenced_json() {
        let text = "```json\n{\"a\": }\n```";
        let err = extract_json(text).unwrap_err();
        assert_eq!(err.kind, ResponseErrorKind::FencedJson);
        assert_eq!(err.to_string(), "Failed to parse extracted JSON.");
        assert_eq!(err.raw_response, text);
        assert!(!err.details.is_empty());
    }

    #[test]
    fn test_invalid_bare_json() {
        let text = "I could not find any headings in this document.";
        let err = extract_json(text).unwrap_err();
        assert_eq!(err.kind, ResponseErrorKind::BareJson);
        assert_eq!(err.to_string(), "Failed to parse AI response as JSON.");
        assert_eq!(err.raw_response, text);
    }

    #[test]
    fn test_array_fence_is_not_matched() {
        // Only object bodies count as fenced JSON; the whole text is tried instead.
        let text = "```json\n[1, 2]\n```";
        let err = extract_json(text).unwrap_err();
        assert_eq!(err.kind, ResponseErrorKind::BareJson);
    }
}
