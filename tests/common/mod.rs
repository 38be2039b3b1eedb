//! Small PDFs assembled in memory for the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Smallest byte sequence with JPEG start and end markers.
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

/// One `Tj` line: font resource (`F1` regular, `F2` bold, `F3` italic), size, text.
pub type Line<'a> = (&'a str, i64, &'a str);

/// Builder for test documents.
#[derive(Default)]
pub struct PdfFixture {
    pages: Vec<Vec<Operation>>,
    tagged: bool,
    jpeg_pages: Vec<usize>,
    raw_image_pages: Vec<usize>,
    cmyk_image_pages: Vec<usize>,
    title: Option<String>,
}

impl PdfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page showing `lines` top to bottom.
    pub fn page(mut self, lines: &[Line<'_>]) -> Self {
        let mut ops = vec![Operation::new("BT", vec![])];
        let mut y = 720;
        for (font, size, text) in lines {
            ops.push(Operation::new("Tf", vec![Object::from(*font), (*size).into()]));
            ops.push(Operation::new("Td", vec![72.into(), y.into()]));
            ops.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            y -= 30;
        }
        ops.push(Operation::new("ET", vec![]));
        self.pages.push(ops);
        self
    }

    /// Add a `/StructTreeRoot` with a Document, an H1 and a P.
    pub fn tagged(mut self) -> Self {
        self.tagged = true;
        self
    }

    /// Put a DCT-encoded image on the page at `index` (0-based).
    pub fn with_jpeg(mut self, index: usize) -> Self {
        self.jpeg_pages.push(index);
        self
    }

    /// Put an unfiltered 2x2 DeviceRGB image on the page at `index`.
    pub fn with_raw_image(mut self, index: usize) -> Self {
        self.raw_image_pages.push(index);
        self
    }

    /// Put an unfiltered 2x2 DeviceCMYK image on the page at `index`.
    pub fn with_cmyk_image(mut self, index: usize) -> Self {
        self.cmyk_image_pages.push(index);
        self
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font = |doc: &mut Document, base: &str| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(base.as_bytes().to_vec()),
                "Encoding" => "WinAnsiEncoding",
            })
        };
        let regular = font(&mut doc, "Helvetica");
        let bold = font(&mut doc, "Helvetica-Bold");
        let italic = font(&mut doc, "Helvetica-Oblique");

        let mut kids = Vec::new();
        for (i, ops) in self.pages.into_iter().enumerate() {
            let mut resources = dictionary! {
                "Font" => dictionary! { "F1" => regular, "F2" => bold, "F3" => italic },
            };
            if self.jpeg_pages.contains(&i) {
                let image = image_xobject(&mut doc, "DCTDecode", "DeviceRGB", FAKE_JPEG.to_vec());
                resources.set("XObject", dictionary! { "Im1" => image });
            } else if self.raw_image_pages.contains(&i) {
                let image = image_xobject(&mut doc, "", "DeviceRGB", vec![0x80; 12]);
                resources.set("XObject", dictionary! { "Im1" => image });
            } else if self.cmyk_image_pages.contains(&i) {
                let image = image_xobject(&mut doc, "", "DeviceCMYK", vec![0x40; 16]);
                resources.set("XObject", dictionary! { "Im1" => image });
            }

            let encoded = Content { operations: ops }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        if self.tagged {
            let root = structure_tree(&mut doc);
            catalog.set("StructTreeRoot", root);
            catalog.set("MarkInfo", dictionary! { "Marked" => true });
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = self.title {
            let info = doc.add_object(dictionary! {
                "Title" => Object::string_literal(title),
                "CreationDate" => Object::string_literal("D:20240115103000Z"),
            });
            doc.trailer.set("Info", info);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}

fn image_xobject(doc: &mut Document, filter: &str, space: &str, data: Vec<u8>) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => 2,
        "Height" => 2,
        "ColorSpace" => Object::Name(space.as_bytes().to_vec()),
        "BitsPerComponent" => 8,
    };
    if !filter.is_empty() {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    doc.add_object(Stream::new(dict, data))
}

/// `/StructTreeRoot` -> Document -> [H1 (MCID 0), P (text)].
fn structure_tree(doc: &mut Document) -> ObjectId {
    let root_id = doc.new_object_id();
    let document_id = doc.new_object_id();

    let h1 = doc.add_object(dictionary! {
        "Type" => "StructElem",
        "S" => "H1",
        "P" => document_id,
        "K" => 0,
    });
    let p = doc.add_object(dictionary! {
        "Type" => "StructElem",
        "S" => "P",
        "P" => document_id,
        "K" => Object::string_literal("Quarterly results"),
    });
    doc.objects.insert(
        document_id,
        Object::Dictionary(dictionary! {
            "Type" => "StructElem",
            "S" => "Document",
            "P" => root_id,
            "K" => vec![h1.into(), p.into()],
        }),
    );
    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "StructTreeRoot",
            "K" => document_id,
        }),
    );
    root_id
}

/// The ASCII dump of the tree above.
pub const TAGGED_ASCII: &str = "[Unknown Type]:\n  [Document]:\n    [H1] -> 0\n    [P] -> Quarterly results\n";
