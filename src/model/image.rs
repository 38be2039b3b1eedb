//! Images embedded in pages.

use serde::{Deserialize, Serialize};

/// An image XObject found on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-based page number
    pub page_number: u32,

    /// Position among the page's images (0-based)
    pub index: usize,

    /// Resource name in the page's XObject dictionary
    pub name: String,

    /// Raw image bytes (encoded for JPEG/JPEG 2000, decoded samples otherwise)
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// MIME type, `application/octet-stream` for raw samples
    pub mime_type: String,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,
}

impl PageImage {
    /// Whether a hosted vision model can consume the bytes as-is.
    pub fn is_encoded(&self) -> bool {
        matches!(
            self.mime_type.as_str(),
            "image/jpeg" | "image/png" | "image/jp2"
        )
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/jp2" => "jp2",
            _ => "bin",
        }
    }

    /// Suggested file name, e.g. `page1_img0.jpg`.
    pub fn suggested_filename(&self) -> String {
        format!(
            "page{}_img{}.{}",
            self.page_number,
            self.index,
            self.extension()
        )
    }
}
