//! Error types for the pdftag library.

use std::io;
use thiserror::Error;

use crate::ai::ResponseError;

/// Result type alias for pdftag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while tagging a PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF header carries a version string we cannot read.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error extracting images from PDF.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// Error during rendering (Markdown, JSON, DOT).
    #[error("Rendering error: {0}")]
    Render(String),

    /// The API credential is not configured.
    #[error("{0} is not set in the environment variables")]
    MissingCredential(String),

    /// The hosted model answered with a non-success status.
    #[error("HTTP error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response arrived but did not have the expected shape.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The model's text could not be parsed as JSON.
    #[error(transparent)]
    MalformedResponse(#[from] ResponseError),

    /// Artifact storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => Error::InvalidResponse(err.to_string()),
            None => Error::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}
