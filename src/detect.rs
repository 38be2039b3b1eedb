//! PDF header sniffing.
//!
//! Uploads arrive as arbitrary byte buffers, so the header is checked before
//! the buffer is handed to the PDF library.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers are allowed to find the header anywhere in the first kilobyte.
const HEADER_WINDOW: usize = 1024;

/// What the header told us about the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// Version string, e.g. "1.7"
    pub version: String,
    /// Byte offset of `%PDF-` (non-zero when junk precedes the header)
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Sniff the PDF header from the start of a byte buffer.
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let rest = &window[offset + PDF_MAGIC.len()..];
    if rest.len() < 3 {
        return Err(Error::UnknownFormat);
    }

    let version = String::from_utf8_lossy(&rest[..3]).to_string();
    match version.as_bytes() {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(PdfHeader { version, offset })
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

/// Sniff the PDF header of a file on disk.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut head = Vec::with_capacity(HEADER_WINDOW);
    File::open(path)?
        .take(HEADER_WINDOW as u64)
        .read_to_end(&mut head)?;
    sniff_bytes(&head)
}

/// Check whether a byte buffer looks like a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}
