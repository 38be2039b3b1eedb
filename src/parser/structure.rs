//! Reading the accessibility structure tree (`/StructTreeRoot`).
//!
//! The tree is copied into owned [`StructNode`]s so that serialization never
//! touches the PDF library. References are resolved here, once; a visited set
//! and a depth cap keep malformed files from recursing forever.

use std::collections::HashSet;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{StructKids, StructNode};

use super::content::decode_text_simple;

/// Deeper trees than this are cut off; real documents stay well below 20.
pub const MAX_STRUCTURE_DEPTH: usize = 256;

/// Read the structure tree of a document.
///
/// Returns `Ok(None)` for untagged documents.
pub fn read_structure_tree(doc: &LopdfDocument) -> Result<Option<StructNode>> {
    let catalog = doc.catalog()?;
    let root = match catalog.get(b"StructTreeRoot") {
        Ok(obj) => obj,
        Err(_) => return Ok(None),
    };

    let mut reader = TreeReader {
        doc,
        visited: HashSet::new(),
    };
    match reader.resolve(root)? {
        Resolved::Fresh(Object::Dictionary(dict)) => Ok(Some(reader.node(dict, 0))),
        _ => Err(Error::PdfParse(
            "StructTreeRoot is not a dictionary".to_string(),
        )),
    }
}

/// Check for a structure tree without reading it.
pub fn has_structure_tree(doc: &LopdfDocument) -> bool {
    doc.catalog()
        .map(|catalog| catalog.has(b"StructTreeRoot"))
        .unwrap_or(false)
}

enum Resolved<'a> {
    Fresh(&'a Object),
    Revisited(ObjectId),
}

struct TreeReader<'a> {
    doc: &'a LopdfDocument,
    visited: HashSet<ObjectId>,
}

impl<'a> TreeReader<'a> {
    fn resolve(&mut self, obj: &'a Object) -> Result<Resolved<'a>> {
        match obj {
            Object::Reference(id) => {
                if !self.visited.insert(*id) {
                    return Ok(Resolved::Revisited(*id));
                }
                Ok(Resolved::Fresh(self.doc.get_object(*id)?))
            }
            _ => Ok(Resolved::Fresh(obj)),
        }
    }

    fn node(&mut self, dict: &'a Dictionary, depth: usize) -> StructNode {
        let tag = dict
            .get(b"S")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string());

        let kids = match dict.get(b"K") {
            Err(_) => StructKids::Absent,
            Ok(_) if depth >= MAX_STRUCTURE_DEPTH => {
                log::warn!("Structure tree deeper than {}, truncating", MAX_STRUCTURE_DEPTH);
                StructKids::Absent
            }
            Ok(k) => self.kids(k, depth),
        };

        StructNode { tag, kids }
    }

    fn kids(&mut self, k: &'a Object, depth: usize) -> StructKids {
        let k = match self.resolve(k) {
            Ok(Resolved::Fresh(obj)) => obj,
            Ok(Resolved::Revisited(id)) => return StructKids::Content(cycle_marker(id)),
            Err(e) => {
                log::warn!("Unresolvable /K entry: {}", e);
                return StructKids::Absent;
            }
        };

        match k {
            Object::Array(items) => StructKids::Nodes(
                items
                    .iter()
                    .map(|item| self.child(item, depth + 1))
                    .collect(),
            ),
            Object::Dictionary(d) if is_struct_elem(d) => {
                StructKids::Nodes(vec![self.node(d, depth + 1)])
            }
            other => StructKids::Content(terminal_text(other)),
        }
    }

    fn child(&mut self, item: &'a Object, depth: usize) -> StructNode {
        match self.resolve(item) {
            Ok(Resolved::Fresh(Object::Dictionary(d))) => self.node(d, depth),
            Ok(Resolved::Fresh(other)) => StructNode {
                tag: None,
                kids: StructKids::Content(terminal_text(other)),
            },
            Ok(Resolved::Revisited(id)) => StructNode {
                tag: None,
                kids: StructKids::Content(cycle_marker(id)),
            },
            Err(e) => {
                log::warn!("Unresolvable structure element: {}", e);
                StructNode {
                    tag: None,
                    kids: StructKids::Absent,
                }
            }
        }
    }
}

fn is_struct_elem(dict: &Dictionary) -> bool {
    dict.has(b"S")
        || dict
            .get(b"Type")
            .and_then(|t| t.as_name())
            .map(|t| t == b"StructElem")
            .unwrap_or(false)
}

fn cycle_marker(id: ObjectId) -> String {
    log::warn!("Structure tree revisits object {} {} R", id.0, id.1);
    format!("{} {} R (already visited)", id.0, id.1)
}

/// Text shown for terminal `/K` content.
fn terminal_text(obj: &Object) -> String {
    match obj {
        Object::Integer(mcid) => mcid.to_string(),
        Object::Real(r) => r.to_string(),
        Object::String(bytes, _) => decode_text_simple(bytes),
        Object::Name(name) => String::from_utf8_lossy(name).to_string(),
        Object::Reference(id) => format!("{} {} R", id.0, id.1),
        Object::Dictionary(d) => match d.get(b"MCID").and_then(|m| m.as_i64()) {
            Ok(mcid) => format!("MCID {}", mcid),
            Err(_) => "<<dictionary>>".to_string(),
        },
        Object::Array(items) => items
            .iter()
            .map(terminal_text)
            .collect::<Vec<_>>()
            .join(" "),
        Object::Null => "null".to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Stream(_) => "<<stream>>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_catalog(extra: impl FnOnce(&mut LopdfDocument) -> Option<ObjectId>) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.7");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let tree = extra(&mut doc);
        let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        if let Some(tree) = tree {
            catalog.set("StructTreeRoot", tree);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_untagged_document() {
        let doc = doc_with_catalog(|_| None);
        assert!(!has_structure_tree(&doc));
        assert!(read_structure_tree(&doc).unwrap().is_none());
    }

    #[test]
    fn test_reads_nested_tree() {
        let doc = doc_with_catalog(|doc| {
            let h1 = doc.add_object(dictionary! {
                "Type" => "StructElem",
                "S" => "H1",
                "K" => 0,
            });
            let p = doc.add_object(dictionary! {
                "Type" => "StructElem",
                "S" => "P",
                "K" => vec![1.into(), 2.into()],
            });
            let figure = doc.add_object(dictionary! { "S" => "Figure" });
            let document = doc.add_object(dictionary! {
                "Type" => "StructElem",
                "S" => "Document",
                "K" => vec![h1.into(), p.into(), figure.into()],
            });
            Some(doc.add_object(dictionary! {
                "Type" => "StructTreeRoot",
                "K" => document,
            }))
        });

        assert!(has_structure_tree(&doc));
        let root = read_structure_tree(&doc).unwrap().unwrap();
        assert_eq!(root.tag, None);

        let StructKids::Nodes(top) = &root.kids else {
            panic!("expected the Document element under the root");
        };
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].tag.as_deref(), Some("Document"));

        let StructKids::Nodes(children) = &top[0].kids else {
            panic!("expected children under Document");
        };
        assert_eq!(children[0], StructNode::with_content("H1", "0"));
        assert_eq!(children[2], StructNode::leaf("Figure"));

        let StructKids::Nodes(mcids) = &children[1].kids else {
            panic!("expected MCID list under P");
        };
        assert_eq!(mcids.len(), 2);
        assert_eq!(mcids[0].tag, None);
        assert_eq!(mcids[0].kids, StructKids::Content("1".to_string()));
    }

    #[test]
    fn test_cycle_is_cut() {
        let doc = doc_with_catalog(|doc| {
            let sect_id = doc.new_object_id();
            doc.objects.insert(
                sect_id,
                Object::Dictionary(dictionary! {
                    "S" => "Sect",
                    "K" => vec![Object::Reference(sect_id)],
                }),
            );
            Some(doc.add_object(dictionary! {
                "Type" => "StructTreeRoot",
                "K" => vec![Object::Reference(sect_id)],
            }))
        });

        let root = read_structure_tree(&doc).unwrap().unwrap();
        assert_eq!(root.node_count(), 3);
        assert_eq!(root.depth(), 3);
    }

    #[test]
    fn test_terminal_text() {
        assert_eq!(terminal_text(&Object::Integer(7)), "7");
        assert_eq!(terminal_text(&Object::string_literal("Alt text")), "Alt text");
        let mcr = Object::Dictionary(dictionary! { "Type" => "MCR", "MCID" => 4 });
        assert_eq!(terminal_text(&mcr), "MCID 4");
    }
}
