//! Process-wide configuration for the hosted model.
//!
//! Loaded once at startup and handed to the client; nothing else reads the
//! environment.

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the API bearer token.
pub const API_KEY_VAR: &str = "MISTRAL_API_KEY";

/// Optional override for the model identifier.
pub const MODEL_VAR: &str = "PDFTAG_MODEL";

/// Optional override for the chat-completion endpoint.
pub const ENDPOINT_VAR: &str = "PDFTAG_ENDPOINT";

/// Default chat-completion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";

/// Default multimodal model.
pub const DEFAULT_MODEL: &str = "pixtral-12b-2409";

/// Configuration for talking to the hosted model.
#[derive(Clone)]
pub struct Config {
    /// Bearer token
    pub api_key: String,

    /// Chat-completion endpoint URL
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Request timeout (`None` waits indefinitely)
    pub timeout: Option<Duration>,
}

impl Config {
    /// Create a configuration with the given credential and default endpoint/model.
    ///
    /// A blank key is treated as missing.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential(API_KEY_VAR.to_string()));
        }

        Ok(Self {
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        })
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR).unwrap_or_default();
        let mut config = match Self::new(api_key) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{} is not set.", API_KEY_VAR);
                return Err(e);
            }
        };

        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|e| !e.trim().is_empty()) {
            config.endpoint = endpoint;
        }

        Ok(config)
    }

    /// Set the endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// The key never shows up in logs or panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
