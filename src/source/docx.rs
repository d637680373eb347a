//! DOCX line source.
//!
//! DOCX files carry no page geometry, so each top-level body paragraph
//! becomes one line. Its `top` is the paragraph's ordinal in the body and
//! its statistics come from direct run formatting (`w:sz`, `w:rFonts`).
//! Paragraphs inside tables and text boxes are not part of the body flow
//! and are skipped.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::detect::FileKind;
use crate::error::{Error, Result};
use crate::model::{count_items, Line, SizeKey};
use crate::parser::LineAggregator;

use super::LineSource;

/// Font name used when a run sets none.
pub const UNKNOWN_FONT: &str = "Unknown";

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts lines from DOCX documents.
#[derive(Debug, Clone, Default)]
pub struct DocxSource {
    _private: (),
}

impl DocxSource {
    /// Create a new DOCX source.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Read the body paragraphs of a DOCX archive.
    pub fn paragraphs_from_bytes(&self, bytes: &[u8]) -> Result<Vec<DocxParagraph>> {
        FileKind::Docx.validate_bytes(bytes)?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut xml = String::new();
        match archive.by_name(DOCUMENT_PART) {
            Ok(mut file) => {
                file.read_to_string(&mut xml)?;
            }
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(Error::DocxParse(format!("missing {}", DOCUMENT_PART)));
            }
            Err(e) => return Err(e.into()),
        }

        parse_document_xml(&xml)
    }
}

impl LineSource for DocxSource {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn extract_bytes(&self, bytes: &[u8], _aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let paragraphs = self.paragraphs_from_bytes(bytes)?;
        let lines: Vec<Line> = paragraphs
            .iter()
            .filter_map(DocxParagraph::to_line_parts)
            .enumerate()
            .map(|(line_index, parts)| parts.into_line(line_index))
            .collect();

        log::debug!(
            "DOCX: {} paragraphs -> {} lines",
            paragraphs.len(),
            lines.len()
        );
        Ok(lines)
    }
}

/// A run of text with its direct formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxRun {
    /// Concatenated `w:t` text, with `w:tab` as a tab and `w:br` as a newline
    pub text: String,
    /// `w:rFonts/@w:ascii`
    pub font_name: Option<String>,
    /// `w:sz` converted from half-points
    pub font_size: Option<f32>,
}

/// A top-level body paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxParagraph {
    /// Position among all body paragraphs, empty ones included
    pub index: usize,
    /// Runs in document order
    pub runs: Vec<DocxRun>,
}

impl DocxParagraph {
    /// Paragraph text: all run texts concatenated.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn to_line_parts(&self) -> Option<LineParts> {
        let text = self.text().trim().to_string();
        if text.is_empty() {
            return None;
        }

        let mut sizes = Vec::new();
        let mut fonts = Vec::new();
        for run in self.runs.iter().filter(|r| !r.text.trim().is_empty()) {
            fonts.push(
                run.font_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_FONT.to_string()),
            );
            sizes.push(SizeKey::from_points(run.font_size.unwrap_or(0.0)));
        }
        if sizes.is_empty() {
            sizes.push(SizeKey::from_points(0.0));
        }

        Some(LineParts {
            text,
            top: self.index as f32,
            sizes,
            fonts,
        })
    }
}

struct LineParts {
    text: String,
    top: f32,
    sizes: Vec<SizeKey>,
    fonts: Vec<String>,
}

impl LineParts {
    fn into_line(self, line_index: usize) -> Line {
        Line::new(
            self.text,
            line_index,
            0,
            self.top,
            count_items(self.sizes),
            count_items(self.fonts),
        )
    }
}

/// Parser state while walking `word/document.xml`.
#[derive(Default)]
struct BodyWalker {
    /// Local names of the open elements
    stack: Vec<Vec<u8>>,
    paragraphs: Vec<DocxParagraph>,
    next_index: usize,
    /// Open body paragraph and its stack position
    paragraph: Option<(DocxParagraph, usize)>,
    /// Open run of that paragraph and its stack position
    run: Option<(DocxRun, usize)>,
    in_text: bool,
}

impl BodyWalker {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.stack.last().map_or(false, |n| n.as_slice() == name)
    }

    fn innermost(&self, name: &[u8]) -> Option<usize> {
        self.stack.iter().rposition(|n| n.as_slice() == name)
    }

    /// Check that the innermost open run is the tracked one.
    fn in_own_run(&self) -> bool {
        match (&self.paragraph, &self.run) {
            (Some((_, p)), Some((_, r))) => {
                self.innermost(b"r") == Some(*r) && self.innermost(b"p") == Some(*p)
            }
            _ => false,
        }
    }

    /// Check that the parent element is the tracked run's `w:rPr`.
    fn in_own_run_properties(&self) -> bool {
        let Some((_, r)) = &self.run else {
            return false;
        };
        self.parent_is(b"rPr") && self.stack.len() >= 2 && self.stack.len() - 2 == *r
    }

    fn start_paragraph(&mut self, position: usize) {
        let paragraph = DocxParagraph {
            index: self.next_index,
            runs: Vec::new(),
        };
        self.next_index += 1;
        self.paragraph = Some((paragraph, position));
    }

    /// Handle an element opening, self-closing or not.
    fn open(&mut self, e: &BytesStart, self_closing: bool) {
        let position = self.stack.len();

        match e.local_name().as_ref() {
            b"p" if self.paragraph.is_none() && self.parent_is(b"body") => {
                self.start_paragraph(position);
                if self_closing {
                    self.finish_paragraph();
                }
            }
            b"r" if !self_closing && self.run.is_none() => {
                let own = matches!(&self.paragraph, Some((_, p)) if self.innermost(b"p") == Some(*p));
                if own {
                    self.run = Some((DocxRun::default(), position));
                }
            }
            b"t" if !self_closing && self.in_own_run() => self.in_text = true,
            b"tab" if self.in_own_run() && !self.parent_is(b"tabs") => self.push_text("\t"),
            b"br" | b"cr" if self.in_own_run() => self.push_text("\n"),
            b"sz" if self.in_own_run_properties() => {
                let size = get_attribute(e, "val").and_then(|v| v.parse::<f32>().ok());
                if let (Some((run, _)), Some(half_points)) = (self.run.as_mut(), size) {
                    run.font_size = Some(half_points / 2.0);
                }
            }
            b"rFonts" if self.in_own_run_properties() => {
                if let (Some((run, _)), Some(font)) = (self.run.as_mut(), get_attribute(e, "ascii")) {
                    run.font_name = Some(font);
                }
            }
            _ => {}
        }

        if !self_closing {
            self.stack.push(e.local_name().as_ref().to_vec());
        }
    }

    fn close(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        let position = self.stack.len();

        match name.as_slice() {
            b"t" => self.in_text = false,
            b"r" if matches!(&self.run, Some((_, r)) if *r == position) => {
                if let (Some((run, _)), Some((paragraph, _))) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"p" if matches!(&self.paragraph, Some((_, p)) if *p == position) => {
                self.finish_paragraph();
            }
            _ => {}
        }
    }

    fn finish_paragraph(&mut self) {
        self.run = None;
        self.in_text = false;
        if let Some((paragraph, _)) = self.paragraph.take() {
            self.paragraphs.push(paragraph);
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((run, _)) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }
}

/// Parse the body paragraphs of a `word/document.xml` part.
pub fn parse_document_xml(xml: &str) -> Result<Vec<DocxParagraph>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut walker = BodyWalker::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => walker.open(e, false),
            Event::Empty(ref e) => walker.open(e, true),
            Event::End(_) => walker.close(),
            Event::Text(ref t) if walker.in_text => {
                let text = t.unescape()?;
                walker.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.paragraphs)
}

fn get_attribute(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Some(String::from_utf8_lossy(&attr.value).to_string());
        }
    }
    None
}
