//! PDF word source.
//!
//! Walks each page's content stream with lopdf, tracking the text matrix
//! and current font, and emits one [`Word`] per whitespace-delimited token of
//! shown text. Positions are converted from PDF's bottom-up coordinates to a
//! top-down `top`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::FileKind;
use crate::error::{Error, Result};
use crate::model::{validate_pages, Line, Word};
use crate::parser::{LineAggregator, DEFAULT_LINE_THRESHOLD};

use super::LineSource;

/// Fraction of the font size above the baseline used as the word top.
const ASCENT: f32 = 0.8;

/// Letter-size fallback when a page has no usable MediaBox.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// TJ adjustment (thousandths of text space) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Rough glyph advance as a fraction of the font size, for word x offsets.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Default text leading used by `T*`, `'` and `"`.
const DEFAULT_LEADING: f32 = 12.0;

/// Extracts lines from PDF documents.
#[derive(Debug, Clone, Default)]
pub struct PdfSource {
    _private: (),
}

impl PdfSource {
    /// Create a new PDF source.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Extract positioned words, one list per page, in reading order.
    pub fn words_from_bytes(&self, bytes: &[u8]) -> Result<Vec<Vec<Word>>> {
        self.words_with_tolerance(bytes, DEFAULT_LINE_THRESHOLD)
    }

    /// Extract words, treating tops within `tolerance` of a row's first
    /// word as one row ordered left to right.
    pub fn words_with_tolerance(&self, bytes: &[u8], tolerance: f32) -> Result<Vec<Vec<Word>>> {
        FileKind::Pdf.validate_bytes(bytes)?;

        let doc = LopdfDocument::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(Error::PdfParse(
                "encrypted documents are not supported".to_string(),
            ));
        }

        let reader = PageReader { doc: &doc };
        let mut pages = Vec::new();
        for (page_num, page_id) in doc.get_pages() {
            let words = reader.page_words(page_id, tolerance)?;
            log::debug!("PDF page {}: {} words", page_num, words.len());
            pages.push(words);
        }

        Ok(pages)
    }
}

impl LineSource for PdfSource {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "pdf"
    }

    fn extract_bytes(&self, bytes: &[u8], aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let pages = self.words_with_tolerance(bytes, aggregator.threshold())?;
        validate_pages(&pages)?;
        Ok(aggregator.aggregate_document(&pages))
    }
}

/// A word before ordering, with its horizontal position.
struct PlacedWord {
    word: Word,
    x: f32,
}

/// Sort words top to bottom, then left to right within each row.
///
/// A row collects every word whose top lies within `tolerance` of the row's
/// first word, so jittered baselines and mixed sizes keep their x order.
fn reading_order(mut placed: Vec<PlacedWord>, tolerance: f32) -> Vec<Word> {
    placed.sort_by(|a, b| a.word.top.total_cmp(&b.word.top).then(a.x.total_cmp(&b.x)));

    let mut ordered = Vec::with_capacity(placed.len());
    let mut row: Vec<PlacedWord> = Vec::new();
    for word in placed {
        if let Some(first) = row.first() {
            if word.word.top - first.word.top > tolerance {
                flush_row(&mut row, &mut ordered);
            }
        }
        row.push(word);
    }
    flush_row(&mut row, &mut ordered);

    ordered
}

fn flush_row(row: &mut Vec<PlacedWord>, ordered: &mut Vec<Word>) {
    row.sort_by(|a, b| a.x.total_cmp(&b.x));
    ordered.extend(row.drain(..).map(|p| p.word));
}

/// Content-stream reader for one document.
struct PageReader<'a> {
    doc: &'a LopdfDocument,
}

impl<'a> PageReader<'a> {
    /// Words of one page in reading order.
    fn page_words(&self, page_id: ObjectId, tolerance: f32) -> Result<Vec<Word>> {
        let page_top = self.page_top(page_id);
        let fonts = self.doc.get_page_fonts(page_id)?;
        let content = match self.page_content(page_id)? {
            Some(content) => content,
            None => return Ok(Vec::new()),
        };

        let placed = self.parse_content(&content, &fonts, page_top)?;
        Ok(reading_order(placed, tolerance))
    }

    /// Upper edge of the page in PDF user space, from the (inherited) MediaBox.
    fn page_top(&self, page_id: ObjectId) -> f32 {
        let mut current = Some(page_id);
        // Page tree depth is small; the bound guards against reference cycles.
        for _ in 0..32 {
            let Some(id) = current else { break };
            let Ok(dict) = self.doc.get_dictionary(id) else { break };

            if let Ok(media_box) = dict.get(b"MediaBox") {
                if let Some(top) = self.media_box_top(media_box) {
                    return top;
                }
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        DEFAULT_PAGE_HEIGHT
    }

    fn media_box_top(&self, obj: &Object) -> Option<f32> {
        let obj = match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok()?,
            other => other,
        };
        let array = obj.as_array().ok()?;
        if array.len() < 4 {
            return None;
        }
        let y0 = get_number(&array[1])?;
        let y1 = get_number(&array[3])?;
        Some(y0.max(y1))
    }

    /// Page content bytes, or `None` for a page without content.
    fn page_content(&self, page_id: ObjectId) -> Result<Option<Vec<u8>>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            Err(_) => return Ok(None),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r)? {
                Object::Stream(s) => Ok(Some(stream_bytes(s))),
                Object::Array(arr) => self.concat_streams(arr).map(Some),
                _ => Err(Error::PdfParse("Invalid content stream".to_string())),
            },
            Object::Array(arr) => self.concat_streams(arr).map(Some),
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn concat_streams(&self, refs: &[Object]) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for obj in refs {
            if let Object::Reference(r) = obj {
                if let Object::Stream(s) = self.doc.get_object(*r)? {
                    content.extend_from_slice(&stream_bytes(s));
                    content.push(b' ');
                }
            }
        }
        Ok(content)
    }

    fn parse_content(
        &self,
        content: &[u8],
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        page_top: f32,
    ) -> Result<Vec<PlacedWord>> {
        let content = lopdf::content::Content::decode(content)?;

        let mut words = Vec::new();
        let mut state = TextState::default();
        let mut in_text_block = false;

        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_text_block = true;
                    state.matrix = TextMatrix::default();
                }
                "ET" => in_text_block = false,
                "Tf" => {
                    if let [Object::Name(resource), size, ..] = op.operands.as_slice() {
                        state.font_name = base_font_name(fonts, resource);
                        state.font_resource = resource.clone();
                        state.font_size = get_number(size).unwrap_or(state.font_size);
                    }
                }
                "TL" => {
                    if let Some(leading) = op.operands.first().and_then(get_number) {
                        state.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if let [tx, ty, ..] = op.operands.as_slice() {
                        let ty = get_number(ty).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        state.matrix.translate(get_number(tx).unwrap_or(0.0), ty);
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
                        state.matrix.set(n[0], n[1], n[2], n[3], n[4], n[5]);
                    }
                }
                "T*" => state.matrix.next_line(state.leading),
                "Tj" if in_text_block => {
                    if let Some(Object::String(bytes, _)) = op.operands.first() {
                        let text = self.decode(fonts, &state, bytes);
                        state.emit(&text, page_top, &mut words);
                    }
                }
                "TJ" if in_text_block => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let text = self.decode_array(fonts, &state, items);
                        state.emit(&text, page_top, &mut words);
                    }
                }
                "'" | "\"" => {
                    state.matrix.next_line(state.leading);
                    let index = if op.operator == "\"" { 2 } else { 0 };
                    if in_text_block {
                        if let Some(Object::String(bytes, _)) = op.operands.get(index) {
                            let text = self.decode(fonts, &state, bytes);
                            state.emit(&text, page_top, &mut words);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(words)
    }

    /// Decode a string with the current font's encoding.
    fn decode(&self, fonts: &BTreeMap<Vec<u8>, &Dictionary>, state: &TextState, bytes: &[u8]) -> String {
        let encoding = fonts
            .get(&state.font_resource)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        match encoding {
            Some(ref enc) => LopdfDocument::decode_text(enc, bytes)
                .unwrap_or_else(|_| decode_text_simple(bytes)),
            None => decode_text_simple(bytes),
        }
    }

    /// Decode a TJ array, turning large positioning gaps into spaces.
    fn decode_array(
        &self,
        fonts: &BTreeMap<Vec<u8>, &Dictionary>,
        state: &TextState,
        items: &[Object],
    ) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(fonts, state, bytes)),
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -get_number(item).unwrap_or(0.0);
                    if adjustment > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(char::is_whitespace)
                    {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }
        combined
    }
}

/// Graphics state relevant to text.
struct TextState {
    matrix: TextMatrix,
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: TextMatrix::default(),
            font_resource: Vec::new(),
            font_name: "Unknown".to_string(),
            font_size: 12.0,
            leading: DEFAULT_LEADING,
        }
    }
}

impl TextState {
    /// Split shown text into words at the current text position.
    fn emit(&self, text: &str, page_top: f32, out: &mut Vec<PlacedWord>) {
        if text.trim().is_empty() {
            return;
        }

        let (x, y) = self.matrix.position();
        let size = self.font_size * self.matrix.scale();
        let top = page_top - (y + ASCENT * size);
        let advance = AVG_GLYPH_WIDTH * size;

        let mut offset = 0usize;
        for token in text.split(char::is_whitespace) {
            if !token.is_empty() {
                out.push(PlacedWord {
                    word: Word::new(token, top, self.font_name.clone(), size),
                    x: x + offset as f32 * advance,
                });
            }
            offset += token.chars().count() + 1;
        }
    }
}

/// Text matrix tracking for the position of shown text.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Line matrix origin, restored by Td/T*
    line_e: f32,
    line_f: f32,
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
        }
    }
}

impl TextMatrix {
    fn set(&mut self, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) {
        *self = Self {
            a,
            b,
            c,
            d,
            e,
            f,
            line_e: e,
            line_f: f,
        };
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, leading: f32) {
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.b * self.b + self.d * self.d).sqrt()
    }
}

/// BaseFont of a font resource, or the resource name itself.
fn base_font_name(fonts: &BTreeMap<Vec<u8>, &Dictionary>, resource: &[u8]) -> String {
    fonts
        .get(resource)
        .and_then(|font| font.get(b"BaseFont").ok())
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string())
}

/// Decoded stream data. Streams without a `/Filter` are stored raw.
fn stream_bytes(stream: &Stream) -> Vec<u8> {
    match stream.decompressed_content() {
        Ok(data) => data,
        Err(_) => stream.content.clone(),
    }
}

fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a string without font information: UTF-16BE with BOM, UTF-8, then Latin-1.
fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}
