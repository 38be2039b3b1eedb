//! Graphviz DOT source for a model-generated tag tree.
//!
//! The tree is whatever JSON the model returned, so every field is optional:
//! nodes without `type` render as `unknown`, nodes without `content` get an
//! empty preview, and non-object children are skipped.

use std::fmt::Write as _;

use serde_json::Value;

/// Characters of content shown in a node label.
pub const PREVIEW_CHARS: usize = 30;

/// Render a tag tree as DOT.
///
/// An object root contributes its `children`; an array root is taken as the
/// list of top-level nodes.
pub fn to_dot(tree: &Value) -> String {
    let roots: &[Value] = match tree {
        Value::Object(map) => map
            .get("children")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        Value::Array(items) => items,
        _ => &[],
    };

    let mut graph = DotGraph::default();
    for root in roots {
        graph.add_node(root, None);
    }
    graph.finish()
}

#[derive(Default)]
struct DotGraph {
    body: String,
    next_id: usize,
}

impl DotGraph {
    fn add_node(&mut self, node: &Value, parent: Option<&str>) {
        let Value::Object(map) = node else {
            return;
        };

        let node_type = map.get("type").and_then(Value::as_str).unwrap_or("unknown");
        let content = map.get("content").and_then(Value::as_str).unwrap_or("");

        let id = format!("{}_{}", sanitize_id(node_type), self.next_id);
        self.next_id += 1;

        let label = format!("{}: {}", capitalize(node_type), preview(content));
        let _ = writeln!(
            self.body,
            "\t{} [label=\"{}\" color={}]",
            id,
            escape(&label),
            fill_color(node_type)
        );
        if let Some(parent) = parent {
            let _ = writeln!(self.body, "\t{} -> {}", parent, id);
        }

        if let Some(children) = map.get("children").and_then(Value::as_array) {
            for child in children {
                self.add_node(child, Some(&id));
            }
        }
    }

    fn finish(self) -> String {
        format!(
            "// Tag Tree\ndigraph {{\n\tnode [fontname=Helvetica shape=rectangle style=filled]\n{}}}\n",
            self.body
        )
    }
}

/// Fill colour per element type.
pub fn fill_color(node_type: &str) -> &'static str {
    match node_type {
        "heading" => "lightcoral",
        "subheading" => "lightgreen",
        "list_item" => "lightyellow",
        _ => "lightblue2",
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn sanitize_id(s: &str) -> String {
    let id: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n{}", id)
    } else {
        id
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
