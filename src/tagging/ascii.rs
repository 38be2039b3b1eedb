//! Indented ASCII rendering of a structure tree.
//!
//! ```text
//! [Unknown Type]:
//!   [Document]:
//!     [H1] -> 0
//!     [Figure]
//! ```
//!
//! Each node is `[tag]` indented two spaces per level. A node with children
//! ends in `:` and its children follow on their own lines; a node with
//! terminal content shows it after ` -> `, wrapped at [`CONTENT_WIDTH`]
//! columns.

use crate::model::{StructKids, StructNode};

/// Shown in place of a tree for untagged documents.
pub const NO_STRUCTURE_TREE: &str = "No structure tree found in the PDF.";

/// Tag shown for nodes without `/S`.
pub const UNKNOWN_TAG: &str = "Unknown Type";

/// Wrap width for terminal content.
pub const CONTENT_WIDTH: usize = 50;

/// Serialize a node and its subtree, starting at `depth`.
pub fn serialize_structure(node: &StructNode, depth: usize) -> String {
    let mut out = String::new();
    write_node(node, depth, &mut out);
    out
}

fn write_node(node: &StructNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push('[');
    out.push_str(node.tag.as_deref().unwrap_or(UNKNOWN_TAG));
    out.push(']');

    match &node.kids {
        StructKids::Nodes(children) => {
            out.push_str(":\n");
            for child in children {
                write_node(child, depth + 1, out);
            }
        }
        StructKids::Content(content) => {
            let continuation = format!("{indent}  ");
            out.push_str(" -> ");
            out.push_str(&wrap(content, CONTENT_WIDTH, &continuation));
            out.push('\n');
        }
        StructKids::Absent => out.push('\n'),
    }
}

/// Greedy paragraph fill.
///
/// Whitespace characters become spaces; the text is cut into word and
/// whitespace chunks and packed into lines of at most `width` characters.
/// Whitespace is dropped at line ends and at the start of every line but the
/// first. Lines after the first start with `subsequent_indent`, which counts
/// toward the width. Words that do not fit on a line of their own are broken
/// (after a hyphen when one falls inside the line). Hyphenated words may also
/// break after the hyphen. At least one character is placed per line, so the
/// fill always terminates.
pub fn wrap(text: &str, width: usize, subsequent_indent: &str) -> String {
    let mut chunks = split_chunks(text);
    chunks.reverse();

    let indent_len = subsequent_indent.chars().count();
    let mut lines: Vec<String> = Vec::new();

    while !chunks.is_empty() {
        let (indent, line_width) = if lines.is_empty() {
            ("", width)
        } else {
            (subsequent_indent, width.saturating_sub(indent_len))
        };

        if !lines.is_empty() && chunks.last().is_some_and(|c| is_space(c)) {
            chunks.pop();
        }

        let mut line: Vec<Vec<char>> = Vec::new();
        let mut line_len = 0;
        while let Some(chunk) = chunks.last() {
            if line_len + chunk.len() > line_width {
                break;
            }
            line_len += chunk.len();
            line.extend(chunks.pop());
        }

        if chunks.last().is_some_and(|c| c.len() > line_width) {
            break_long_word(&mut chunks, &mut line, line_len, line_width);
        }

        if line.last().is_some_and(|c| is_space(c)) {
            line.pop();
        }

        if !line.is_empty() {
            let body: String = line.iter().flatten().collect();
            lines.push(format!("{indent}{body}"));
        }
    }

    lines.join("\n")
}

fn is_space(chunk: &[char]) -> bool {
    chunk.iter().all(|&c| c == ' ')
}

/// Move as much of the oversized chunk on top of the stack onto the line as fits.
fn break_long_word(
    chunks: &mut [Vec<char>],
    line: &mut Vec<Vec<char>>,
    line_len: usize,
    line_width: usize,
) {
    let space_left = if line_width < 1 {
        1
    } else {
        line_width.saturating_sub(line_len)
    };

    let Some(chunk) = chunks.last_mut() else {
        return;
    };

    let mut end = space_left;
    if chunk.len() > space_left {
        let hyphen = chunk[..space_left].iter().rposition(|&c| c == '-');
        if let Some(h) = hyphen {
            if h > 0 && chunk[..h].iter().any(|&c| c != '-') {
                end = h + 1;
            }
        }
    }

    let rest = chunk.split_off(end.min(chunk.len()));
    line.push(std::mem::replace(chunk, rest));
}

const TAB_SIZE: usize = 8;

/// Split into alternating space runs and words; hyphenated words (letters on
/// both sides of the hyphen) split after the hyphen and em-dashes stand
/// alone. Only ASCII whitespace separates words, tabs expand to the next
/// multiple of eight columns.
fn split_chunks(text: &str) -> Vec<Vec<char>> {
    let mut normalized: Vec<char> = Vec::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let stop = TAB_SIZE - column % TAB_SIZE;
                normalized.extend(std::iter::repeat(' ').take(stop));
                column += stop;
            }
            '\n' | '\r' => {
                normalized.push(' ');
                column = 0;
            }
            '\x0b' | '\x0c' => {
                normalized.push(' ');
                column += 1;
            }
            c => {
                normalized.push(c);
                column += 1;
            }
        }
    }

    let mut chunks: Vec<Vec<char>> = Vec::new();
    let mut i = 0;
    while i < normalized.len() {
        let space = normalized[i] == ' ';
        let start = i;
        while i < normalized.len() && (normalized[i] == ' ') == space {
            i += 1;
        }
        let run = &normalized[start..i];
        if space {
            chunks.push(run.to_vec());
        } else {
            chunks.extend(split_hyphenated(run));
        }
    }
    chunks
}

fn split_hyphenated(word: &[char]) -> Vec<Vec<char>> {
    let letter = |i: usize| word.get(i).is_some_and(|&c| c.is_alphabetic() || c == '_');
    let word_char = |i: usize| word.get(i).is_some_and(|&c| c.is_alphanumeric() || c == '_');
    let word_punct = |i: usize| word_char(i) || word.get(i).is_some_and(|c| "!\"'&.,?".contains(*c));
    let dashes = |i: usize| word[i.min(word.len())..].iter().take_while(|&&c| c == '-').count();

    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < word.len() {
        // An em-dash ("--" between words) stands alone.
        let run = dashes(i);
        let em_dash = i > 0 && word_punct(i - 1) && run >= 2 && word_char(i + run);
        if em_dash {
            if i > start {
                parts.push(word[start..i].to_vec());
            }
            parts.push(word[i..i + run].to_vec());
            i += run;
            start = i;
            continue;
        }

        let breakable = word[i] == '-'
            && i > start
            && letter(i - 1)
            && i >= 2
            && (letter(i - 2) || (word[i - 2] == '-' && i >= 3 && letter(i - 3)))
            && letter(i + 1)
            && (letter(i + 2) || (word.get(i + 2) == Some(&'-') && letter(i + 3)));
        i += 1;
        if breakable {
            parts.push(word[start..i].to_vec());
            start = i;
        }
    }
    if start < word.len() || parts.is_empty() {
        parts.push(word[start..].to_vec());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_node() {
        assert_eq!(serialize_structure(&StructNode::leaf("P"), 0), "[P]\n");
        assert_eq!(serialize_structure(&StructNode::leaf("Span"), 2), "    [Span]\n");
    }

    #[test]
    fn test_missing_tag() {
        let node = StructNode {
            tag: None,
            kids: StructKids::Absent,
        };
        assert_eq!(serialize_structure(&node, 0), "[Unknown Type]\n");
    }

    #[test]
    fn test_children_follow_parent() {
        let first = StructNode::with_children("L", vec![StructNode::leaf("LI")]);
        let second = StructNode::with_content("P", "0");
        let doc = StructNode::with_children("Document", vec![first.clone(), second.clone()]);

        let expected = format!(
            "[Document]:\n{}{}",
            serialize_structure(&first, 1),
            serialize_structure(&second, 1)
        );
        assert_eq!(serialize_structure(&doc, 0), expected);
        assert_eq!(
            expected,
            "[Document]:\n  [L]:\n    [LI]\n  [P] -> 0\n"
        );
    }

    #[test]
    fn test_empty_children_list() {
        let node = StructNode::with_children("Sect", Vec::new());
        assert_eq!(serialize_structure(&node, 1), "  [Sect]:\n");
    }

    #[test]
    fn test_long_content_wraps_with_indent() {
        let text = "The quick brown fox jumps over the lazy dog and keeps running far away";
        let node = StructNode::with_content("P", text);
        let out = serialize_structure(&node, 1);

        assert_eq!(
            out,
            "  [P] -> The quick brown fox jumps over the lazy dog and\n    keeps running far away\n"
        );
    }

    #[test]
    fn test_wrap_basic() {
        assert_eq!(wrap("hello world", 50, ""), "hello world");
        assert_eq!(wrap("hello world", 5, ""), "hello\nworld");
        assert_eq!(wrap("", 10, ""), "");
        assert_eq!(wrap("   ", 10, ""), "");
    }

    #[test]
    fn test_wrap_normalizes_whitespace() {
        assert_eq!(wrap("a\nb\tc", 50, ""), "a b       c");
        // Non-breaking spaces are not separators.
        assert_eq!(wrap("a\u{A0}b c", 3, ""), "a\u{A0}b\nc");
        // Leading whitespace of the first line survives; trailing does not.
        assert_eq!(wrap("  lead trail  ", 50, ""), "  lead trail");
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        assert_eq!(wrap("abcdefghij", 4, ""), "abcd\nefgh\nij");
        assert_eq!(wrap("abcdefghij", 4, "  "), "abcd\n  ef\n  gh\n  ij");
    }

    #[test]
    fn test_wrap_indent_wider_than_width() {
        // Each continuation line still carries one character.
        assert_eq!(wrap("abcd", 2, "    "), "ab\n    c\n    d");
    }

    #[test]
    fn test_wrap_hyphenated_words() {
        assert_eq!(wrap("well-known fact", 6, ""), "well-\nknown\nfact");
        assert_eq!(split_hyphenated(&"a-b".chars().collect::<Vec<_>>()).len(), 1);
    }

    fn chunks(word: &str) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        split_hyphenated(&chars)
            .into_iter()
            .map(|c| c.into_iter().collect())
            .collect()
    }

    #[test]
    fn test_single_letter_hyphen_runs() {
        assert_eq!(chunks("a-b-cd"), ["a-b-", "cd"]);
        assert_eq!(chunks("x-ray"), ["x-ray"]);
        assert_eq!(wrap("a-b-cd ef", 4, ""), "a-b-\ncd\nef");
    }

    #[test]
    fn test_em_dash_splits() {
        assert_eq!(chunks("wait--what"), ["wait", "--", "what"]);
        assert_eq!(chunks("a---b"), ["a", "---", "b"]);
        assert_eq!(chunks("1990--95"), ["1990", "--", "95"]);
        assert_eq!(chunks("--flag"), ["--flag"]);
        assert_eq!(chunks("end--"), ["end--"]);
        assert_eq!(wrap("wait--what", 6, ""), "wait--\nwhat");
    }
}
