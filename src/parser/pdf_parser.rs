//! PDF document parser using lopdf.

use std::io::Read;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect::{sniff_bytes, sniff_path};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page};

use super::content::{decode_text_simple, SpanExtractor};
use super::images::page_images;
use super::options::{ErrorMode, ParseOptions};
use super::structure::{has_structure_tree, read_structure_tree};

/// PDF document parser.
pub struct PdfParser {
    doc: LopdfDocument,
    options: ParseOptions,
}

impl PdfParser {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let header = sniff_path(path)?;
        log::debug!("Opening {} ({})", path.display(), header);

        let doc = LopdfDocument::load(path).map_err(load_error)?;
        Ok(Self { doc, options })
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let header = sniff_bytes(data)?;
        log::debug!("Loading {} bytes ({})", data.len(), header);

        let doc = LopdfDocument::load_mem(data).map_err(load_error)?;
        Ok(Self { doc, options })
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse the document: metadata, spans of the selected pages, their
    /// images, and the structure tree.
    pub fn parse(&self) -> Result<Document> {
        if self.doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let mut document = Document::new();
        document.metadata = self.extract_metadata();

        let page_ids = self.doc.get_pages();
        let total_pages = page_ids.len() as u32;
        self.check_selection(total_pages)?;

        let extractor = SpanExtractor::new(&self.doc);
        for (&page_num, &page_id) in page_ids.iter() {
            if !self.options.pages.includes(page_num) {
                continue;
            }

            let page = match self.parse_page(&extractor, page_num, page_id) {
                Ok(page) => page,
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page {}: {}", page_num, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            log::debug!("Page {}: {} spans", page_num, page.spans.len());
            document.add_page(page);

            if self.options.extract_images {
                document
                    .images
                    .extend(page_images(&self.doc, page_id, page_num));
            }
        }

        if self.options.extract_structure {
            document.structure = match read_structure_tree(&self.doc) {
                Ok(tree) => tree,
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Ignoring unreadable structure tree: {}", e);
                    None
                }
                Err(e) => return Err(e),
            };
        }

        log::debug!(
            "Parsed {} of {} pages, {} images, structure tree: {}",
            document.pages.len(),
            total_pages,
            document.images.len(),
            document.structure.is_some()
        );

        Ok(document)
    }

    /// Explicit page lists must name pages that exist.
    fn check_selection(&self, total_pages: u32) -> Result<()> {
        use crate::render::PageSelection;

        let highest = match &self.options.pages {
            PageSelection::All => return Ok(()),
            PageSelection::Range(range) => *range.start(),
            PageSelection::Pages(pages) => pages.iter().max().copied().unwrap_or(0),
        };
        if highest > total_pages {
            return Err(Error::PageOutOfRange(highest, total_pages));
        }
        Ok(())
    }

    fn parse_page(&self, extractor: &SpanExtractor<'_>, page_num: u32, page_id: ObjectId) -> Result<Page> {
        let (width, height) = self.page_dimensions(page_id);
        let mut page = Page::new(page_num, width, height);
        page.spans = extractor.page_spans(page_id)?;
        Ok(page)
    }

    /// Width and height from `/MediaBox`, US Letter when absent.
    fn page_dimensions(&self, page_id: ObjectId) -> (f32, f32) {
        let media_box = self
            .doc
            .get_dictionary(page_id)
            .ok()
            .and_then(|page| page.get(b"MediaBox").ok())
            .and_then(|mb| match mb {
                Object::Reference(r) => self.doc.get_object(*r).ok(),
                other => Some(other),
            })
            .and_then(|mb| mb.as_array().ok());

        match media_box {
            Some(values) if values.len() == 4 => {
                let n: Vec<f32> = values
                    .iter()
                    .map(|v| v.as_float().unwrap_or(0.0))
                    .collect();
                ((n[2] - n[0]).abs(), (n[3] - n[1]).abs())
            }
            _ => (612.0, 792.0),
        }
    }

    /// Extract document metadata from the Info dictionary.
    fn extract_metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.doc.version.to_string());
        metadata.page_count = self.page_count();
        metadata.encrypted = self.doc.is_encrypted();
        metadata.tagged = has_structure_tree(&self.doc);

        let info = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(r)) => self.doc.get_dictionary(*r).ok(),
            Ok(Object::Dictionary(d)) => Some(d),
            _ => None,
        };

        if let Some(info) = info {
            metadata.title = info_string(info, b"Title");
            metadata.author = info_string(info, b"Author");
            metadata.subject = info_string(info, b"Subject");
            metadata.creator = info_string(info, b"Creator");
            metadata.producer = info_string(info, b"Producer");
            metadata.created = info_string(info, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified = info_string(info, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Check if the document carries a structure tree.
    pub fn is_tagged(&self) -> bool {
        has_structure_tree(&self.doc)
    }

    /// Get PDF version.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }
}

fn load_error(e: lopdf::Error) -> Error {
    match e {
        lopdf::Error::Decryption(_) => Error::Encrypted,
        _ => Error::from(e),
    }
}

fn info_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    let text = match dict.get(key).ok()? {
        Object::String(bytes, _) => decode_text_simple(bytes),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
///
/// The timezone suffix is ignored; the result is taken as UTC.
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
