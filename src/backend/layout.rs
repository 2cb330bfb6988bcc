//! Positioned text extraction.
//!
//! Walks a page's content stream, tracking the text matrix, and produces
//! [`TextSpan`]s with baseline position and effective font size. Spans feed
//! both the page text rendering (lines plus blank-line paragraph breaks) and
//! the alignment-based table detector.

use std::collections::BTreeMap;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// TJ adjustments above this many text-space units read as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, PDF coordinates grow upwards)
    pub y: f32,
    /// Width of the text, 0 when unknown
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
}

impl TextSpan {
    /// Create a new text span of unknown width.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width: 0.0,
            font_size,
        }
    }
}

/// A text line composed of spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// Spans sorted by X position
    pub spans: Vec<TextSpan>,
    /// Baseline Y of the first span
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size (weighted by text length)
    pub font_size: f32,
}

impl TextLine {
    /// Create a line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        if spans.is_empty() {
            return Self {
                spans,
                y: 0.0,
                x: 0.0,
                font_size: 0.0,
            };
        }

        spans.sort_by(|a, b| a.x.total_cmp(&b.x));

        let total_chars: usize = spans.iter().map(|s| s.text.len()).sum();
        let weighted: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.len() as f32)
            .sum();
        let font_size = if total_chars > 0 {
            weighted / total_chars as f32
        } else {
            spans[0].font_size
        };

        Self {
            y: spans[0].y,
            x: spans[0].x,
            font_size,
            spans,
        }
    }

    /// Combined text of all spans.
    ///
    /// A space separates spans whose horizontal gap exceeds a fifth of the
    /// average character width, except between two CJK characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                let prev = &self.spans[i - 1];
                let gap = span.x - (prev.x + prev.width);

                let char_count = span.text.chars().count();
                let avg_char_width = if char_count > 0 && span.width > 0.0 {
                    span.width / char_count as f32
                } else {
                    span.font_size * 0.5
                };

                let both_spaceless = prev
                    .text
                    .chars()
                    .last()
                    .map(is_spaceless_script_char)
                    .unwrap_or(false)
                    && span
                        .text
                        .chars()
                        .next()
                        .map(is_spaceless_script_char)
                        .unwrap_or(false);

                let already_spaced = prev.text.ends_with([' ', '\u{00A0}'])
                    || span.text.starts_with([' ', '\u{00A0}']);

                if gap > avg_char_width * 0.2 && !both_spaceless && !already_spaced {
                    result.push(' ');
                }
            }
            result.push_str(&span.text);
        }

        result
    }
}

/// Tuning for line grouping and paragraph breaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Baseline tolerance when grouping spans into lines (fraction of font size)
    pub line_tolerance: f32,
    /// Gap above this multiple of the page's average line spacing breaks a paragraph
    pub paragraph_spacing: f32,
    /// Gap above this multiple of the font size breaks a paragraph
    pub paragraph_font_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 0.3,
            paragraph_spacing: 1.5,
            paragraph_font_gap: 2.0,
        }
    }
}

/// Group spans into lines, ordered top to bottom.
pub(crate) fn group_into_lines(spans: Vec<TextSpan>, config: &LayoutConfig) -> Vec<TextLine> {
    let mut spans = spans;
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let tolerance = span.font_size * config.line_tolerance;
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Render lines as page text, inserting a blank line at paragraph breaks.
pub(crate) fn render_text(lines: &[TextLine], config: &LayoutConfig) -> String {
    let avg_spacing = average_line_spacing(lines);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let prev = &lines[i - 1];
            let spacing = (prev.y - line.y).abs();
            let font_size = prev.font_size.max(line.font_size);
            if spacing > avg_spacing * config.paragraph_spacing
                || spacing > font_size * config.paragraph_font_gap
            {
                out.push(String::new());
            }
        }
        out.push(line.text());
    }

    out.join("\n")
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

/// Extract positioned spans from a page (1-based).
pub(crate) fn extract_page_spans(doc: &LopdfDocument, page_number: u32) -> Result<Vec<TextSpan>> {
    let pages = doc.get_pages();
    let page_id = *pages
        .get(&page_number)
        .ok_or(Error::PageOutOfRange(page_number, pages.len() as u32))?;

    let content = page_content(doc, page_id)?;
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let fonts = doc
        .get_page_fonts(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;
    parse_content_stream(doc, &content, &fonts)
}

/// Decompressed content stream of a page; empty when the page has none.
fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_dictionary(page_id)?;

    let contents = match page_dict.get(b"Contents") {
        Ok(contents) => contents,
        Err(_) => return Ok(Vec::new()),
    };

    let stream_bytes = |id: ObjectId| -> Option<Vec<u8>> {
        match doc.get_object(id) {
            Ok(Object::Stream(s)) => Some(
                s.decompressed_content()
                    .unwrap_or_else(|_| s.content.clone()),
            ),
            _ => None,
        }
    };

    match contents {
        Object::Reference(r) => stream_bytes(*r)
            .ok_or_else(|| Error::PdfParse("Invalid content stream".to_string())),
        Object::Array(arr) => {
            let mut content = Vec::new();
            for id in arr.iter().filter_map(|o| o.as_reference().ok()) {
                if let Some(data) = stream_bytes(id) {
                    content.extend_from_slice(&data);
                    content.push(b' ');
                }
            }
            Ok(content)
        }
        _ => Err(Error::PdfParse("Invalid content stream".to_string())),
    }
}

fn parse_content_stream(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
) -> Result<Vec<TextSpan>> {
    let content =
        lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

    let mut spans = Vec::new();
    let mut font_name: Vec<u8> = Vec::new();
    let mut font_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut in_text = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                matrix.begin();
            }
            "ET" => in_text = false,
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (op.operands.first(), op.operands.get(1))
                {
                    font_name = name.clone();
                    font_size = get_number(size).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    matrix.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        matrix.leading = -ty;
                    }
                    matrix.translate(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    let n: Vec<f32> = op
                        .operands
                        .iter()
                        .take(6)
                        .map(|o| get_number(o).unwrap_or(0.0))
                        .collect();
                    matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                }
            }
            "T*" => matrix.next_line(),
            "Tj" | "TJ" | "'" | "\"" if in_text => {
                if op.operator == "'" || op.operator == "\"" {
                    matrix.next_line();
                }
                let text_operand = match op.operator.as_str() {
                    "\"" => op.operands.get(2),
                    _ => op.operands.first(),
                };
                let decode = |bytes: &[u8]| decode_with_font(doc, fonts, &font_name, bytes);
                let text = match text_operand {
                    Some(Object::String(bytes, _)) => decode(bytes.as_slice()),
                    Some(Object::Array(items)) => decode_tj_array(items, decode),
                    _ => String::new(),
                };

                if !text.trim().is_empty() {
                    let (x, y) = matrix.position();
                    spans.push(TextSpan::new(text, x, y, font_size * matrix.scale()));
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Combine a TJ array, turning large negative adjustments into word spaces.
fn decode_tj_array(items: &[Object], decode: impl Fn(&[u8]) -> String) -> String {
    let mut combined = String::new();

    for item in items {
        let adjustment = match item {
            Object::String(bytes, _) => {
                combined.push_str(&decode(bytes.as_slice()));
                continue;
            }
            Object::Integer(n) => -(*n as f32),
            Object::Real(n) => -n,
            _ => continue,
        };

        if adjustment > TJ_SPACE_THRESHOLD && !combined.ends_with([' ', '\u{00A0}']) {
            if let Some(last) = combined.chars().last() {
                if !is_spaceless_script_char(last) {
                    combined.push(' ');
                }
            }
        }
    }

    combined
}

fn decode_with_font(
    doc: &LopdfDocument,
    fonts: &BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    font_name: &[u8],
    bytes: &[u8],
) -> String {
    if let Some(font) = fonts.get(font_name) {
        if let Ok(encoding) = font.get_font_encoding(doc) {
            if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                return text;
            }
        }
    }
    decode_text_simple(bytes)
}

/// Text matrix state for tracking position in a content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    /// Line start, which `Td`/`T*` move relative to
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 12.0,
        }
    }
}

impl TextMatrix {
    /// Reset the matrix at `BT`; leading is graphics state and survives.
    fn begin(&mut self) {
        *self = Self {
            leading: self.leading,
            ..Self::default()
        };
    }

    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Check if a character belongs to a script written without word spaces
/// (Chinese and Japanese; Korean uses spaces).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2EBEF
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3000..=0x303F)
}

/// Decode a string without font information: UTF-16BE with BOM, then UTF-8,
/// then Latin-1.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = body
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
