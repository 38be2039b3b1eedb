//! Span extraction from page content streams.
//!
//! Walks the operators of a page and emits one [`TextSpan`] per run of text
//! sharing a line, font and effective size. The size is the `Tf` size scaled
//! by the text matrix and the current transformation matrix.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::TextSpan;

/// A `TJ` adjustment larger than this (thousandths of an em) reads as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Extracts styled spans from the pages of a loaded document.
pub struct SpanExtractor<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> SpanExtractor<'a> {
    /// Create an extractor over a loaded document.
    pub fn new(doc: &'a LopdfDocument) -> Self {
        Self { doc }
    }

    /// Extract the spans of one page, in content-stream order.
    pub fn page_spans(&self, page_id: ObjectId) -> Result<Vec<TextSpan>> {
        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        // A page without /Contents is blank, not broken.
        let page = self.doc.get_dictionary(page_id)?;
        if !page.has(b"Contents") {
            return Ok(Vec::new());
        }

        let content = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        self.spans_from_content(&content, &fonts)
    }

    fn spans_from_content(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    ) -> Result<Vec<TextSpan>> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut runs = RunBuilder::default();
        let mut state = GraphicsState::default();
        let mut saved: Vec<GraphicsState> = Vec::new();
        let mut matrix = TextMatrix::default();
        let mut in_text = false;

        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => saved.push(state.clone()),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        state = previous;
                    }
                    runs.break_line();
                }
                "cm" if operands.len() >= 6 => {
                    if let Some(m) = matrix_operands(operands) {
                        state.ctm = multiply(&m, &state.ctm);
                    }
                    runs.break_line();
                }
                "BT" => {
                    in_text = true;
                    matrix = TextMatrix::default();
                    runs.break_line();
                }
                "ET" => {
                    in_text = false;
                    runs.break_line();
                }
                "Tf" if operands.len() >= 2 => {
                    if let Object::Name(key) = &operands[0] {
                        state.font_key = key.clone();
                        state.font_name = base_font_name(fonts, key);
                    }
                    state.font_size = number(&operands[1]).unwrap_or(12.0);
                }
                "TL" => {
                    if let Some(leading) = operands.first().and_then(number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" if operands.len() >= 2 => {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    matrix.move_line(tx, ty);
                    runs.break_line();
                }
                "Tm" if operands.len() >= 6 => {
                    if let Some(m) = matrix_operands(operands) {
                        matrix.set(m);
                    }
                    runs.break_line();
                }
                "T*" => {
                    matrix.move_line(0.0, -state.leading);
                    runs.break_line();
                }
                "Tj" if in_text => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        let text = self.decode(fonts, &state.font_key, bytes);
                        runs.show(&state, &matrix, &text);
                    }
                }
                "TJ" if in_text => {
                    if let Some(Object::Array(items)) = operands.first() {
                        let text = self.decode_array(fonts, &state.font_key, items);
                        runs.show(&state, &matrix, &text);
                    }
                }
                "'" | "\"" if in_text => {
                    matrix.move_line(0.0, -state.leading);
                    runs.break_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(Object::String(bytes, _)) = operands.get(idx) {
                        let text = self.decode(fonts, &state.font_key, bytes);
                        runs.show(&state, &matrix, &text);
                    }
                }
                _ => {}
            }
        }

        Ok(runs.finish())
    }

    /// Decode a string operand with the font's encoding, falling back to
    /// UTF-16BE / UTF-8 / Latin-1 sniffing.
    fn decode(&self, fonts: &BTreeMap<Vec<u8>, &Dictionary>, font_key: &[u8], bytes: &[u8]) -> String {
        let encoding = fonts
            .get(font_key)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        match encoding {
            Some(enc) => LopdfDocument::decode_text(&enc, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }

    /// Decode a `TJ` array, turning large negative adjustments into spaces.
    fn decode_array(
        &self,
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        font_key: &[u8],
        items: &[Object],
    ) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(fonts, font_key, bytes)),
                other => {
                    let Some(adjustment) = number(other) else {
                        continue;
                    };
                    let gap = -adjustment > TJ_SPACE_THRESHOLD;
                    let ends_open = combined
                        .chars()
                        .last()
                        .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                    if gap && ends_open {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }
}

/// The parts of the graphics state that affect text: CTM and font.
///
/// Saved and restored as a whole by `q`/`Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: [f32; 6],
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

/// Joins consecutive text-showing operations into spans.
///
/// Text shown on the same line with the same font and size extends the
/// current span; any line move, matrix change or style change starts a new one.
#[derive(Default)]
struct RunBuilder {
    spans: Vec<TextSpan>,
    current: Option<PendingRun>,
    line_open: bool,
}

struct PendingRun {
    span: TextSpan,
    font_key: Vec<u8>,
}

impl RunBuilder {
    fn break_line(&mut self) {
        self.line_open = false;
    }

    fn show(&mut self, state: &GraphicsState, matrix: &TextMatrix, text: &str) {
        let size = state.font_size * vertical_scale(&multiply(&matrix.text, &state.ctm));

        if self.line_open {
            if let Some(run) = self.current.as_mut() {
                if run.font_key == state.font_key && run.span.font_size == size {
                    run.span.text.push_str(text);
                    return;
                }
            }
        }

        self.flush();
        let (x, y) = matrix.position();
        self.current = Some(PendingRun {
            span: TextSpan::new(text, x, y, size, &state.font_name),
            font_key: state.font_key.clone(),
        });
        self.line_open = true;
    }

    fn flush(&mut self) {
        let Some(PendingRun { mut span, .. }) = self.current.take() else {
            return;
        };
        if span.is_blank() {
            return;
        }
        span.text = span.text.trim_end().nfc().collect();
        self.spans.push(span);
    }

    fn finish(mut self) -> Vec<TextSpan> {
        self.flush();
        self.spans
    }
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Text matrix and line matrix, as set by `Tm` and moved by `Td`/`T*`.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    text: [f32; 6],
    line: [f32; 6],
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            text: IDENTITY,
            line: IDENTITY,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        self.text = m;
        self.line = m;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line = [a, b, c, d, e + tx * a + ty * c, f + tx * b + ty * d];
        self.text = self.line;
    }

    fn position(&self) -> (f32, f32) {
        (self.text[4], self.text[5])
    }
}

/// `m × n` for PDF's row-vector `[a b c d e f]` matrices.
fn multiply(m: &[f32; 6], n: &[f32; 6]) -> [f32; 6] {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn vertical_scale(m: &[f32; 6]) -> f32 {
    let scale = (m[2] * m[2] + m[3] * m[3]).sqrt();
    if scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn matrix_operands(operands: &[Object]) -> Option<[f32; 6]> {
    let mut m = [0.0; 6];
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

fn base_font_name(fonts: &BTreeMap<Vec<u8>, &Dictionary>, key: &[u8]) -> String {
    fonts
        .get(key)
        .and_then(|font| font.get(b"BaseFont").ok())
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_else(|| String::from_utf8_lossy(key).to_string())
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Chinese and Japanese runs carry no word spaces; Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2EBEF
        | 0x3040..=0x30FF
        | 0x3000..=0x303F)
}

/// Decode PDF string bytes without a font encoding.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
