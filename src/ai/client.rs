//! Chat-completion client for the hosted multimodal model.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::PageImage;

use super::extract::extract_json;

/// Something that answers a prompt, optionally with images attached.
///
/// The pipeline only talks to the model through this trait, so tests can
/// substitute a canned client.
pub trait ChatClient {
    /// Send one user message and return the assistant's text.
    fn complete(&self, prompt: &str, images: &[ImageInput]) -> Result<String>;
}

impl<C: ChatClient + ?Sized> ChatClient for Box<C> {
    fn complete(&self, prompt: &str, images: &[ImageInput]) -> Result<String> {
        (**self).complete(prompt, images)
    }
}

/// An image attached to a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    /// MIME type used in the data URI
    pub mime_type: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

impl ImageInput {
    /// Wrap encoded image bytes.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

impl From<&PageImage> for ImageInput {
    fn from(image: &PageImage) -> Self {
        Self::new(image.mime_type.clone(), image.data.clone())
    }
}

/// Send a prompt and extract a JSON value from the answer.
pub fn query_json(client: &dyn ChatClient, prompt: &str, images: &[ImageInput]) -> Result<Value> {
    let text = client.complete(prompt, images)?;
    Ok(extract_json(&text)?)
}

/// Client for Mistral's chat-completion endpoint.
pub struct MistralClient {
    http: reqwest::blocking::Client,
    config: Config,
}

impl MistralClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("pdftag/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// The model identifier requests are sent with.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl ChatClient for MistralClient {
    fn complete(&self, prompt: &str, images: &[ImageInput]) -> Result<String> {
        log::info!(
            "Sending request to {} (model {}, {} image(s))",
            self.config.endpoint,
            self.config.model,
            images.len()
        );

        let request = ChatRequest::new(&self.config.model, prompt, images);
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                log::error!("An error occurred: {}", e);
                Error::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::error!("HTTP error occurred: {}", status);
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text()?;
        let content = parse_completion(&body)?;
        log::info!("Successfully received response from the model.");
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: String },
}

impl<'a> ChatRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, images: &[ImageInput]) -> Self {
        let mut content = vec![ContentPart::Text { text: prompt }];
        content.extend(images.iter().map(|image| ContentPart::ImageUrl {
            image_url: image.data_uri(),
        }));

        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// `choices[0].message.content` of a completion body.
fn parse_completion(body: &str) -> Result<String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| Error::InvalidResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::InvalidResponse("response carries no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let images = [ImageInput::new("image/jpeg", vec![1, 2, 3])];
        let request = ChatRequest::new("pixtral-12b-2409", "Describe.", &images);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "model": "pixtral-12b-2409",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "Describe."},
                        {"type": "image_url", "image_url": "data:image/jpeg;base64,AQID"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_request_without_images() {
        let request = ChatRequest::new("m", "Hi", &[]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hello"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "hello");

        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(Error::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(Error::InvalidResponse(_))
        ));
    }

    struct Canned(&'static str);

    impl ChatClient for Canned {
        fn complete(&self, _prompt: &str, _images: &[ImageInput]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_query_json() {
        let client = Canned("```json\n{\"type\": \"heading\"}\n```");
        assert_eq!(
            query_json(&client, "p", &[]).unwrap(),
            json!({"type": "heading"})
        );

        let client = Canned("not json");
        let err = query_json(&client, "p", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Failed to parse AI response as JSON.");
        assert!(matches!(err, Error::MalformedResponse(ref e) if e.raw_response == "not json"));
    }
}
