//! Text repair for extracted lines.
//!
//! PDF text often comes out glyph-corrupted or run together. The repair
//! engine rewrites each line's text once, then attaches the character-level
//! features the classifier consumes. Re-running it on repaired text is a
//! no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::model::{Line, TextFeatures};

use super::segment::{self, Segmenter};

/// Glyph-id artifacts such as `(cid:42)`.
static GLYPH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(cid:\d+\)").unwrap());

/// Maximal runs of ASCII letters or of anything else.
static LETTER_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+|[^A-Za-z]+").unwrap());

/// Characters that mark a line as containing math.
const MATH_SYMBOLS: &str = "=<>+-*/^θλβˆ∑≈≤≥";

/// Alphabetic runs up to this length are never segmented.
const MIN_SEGMENT_LEN: usize = 3;

/// Typographic ligatures and their expansions.
const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Rewrites line text and derives character features.
#[derive(Debug, Clone, Copy)]
pub struct RepairEngine<'a> {
    segmenter: &'a Segmenter,
}

impl<'a> RepairEngine<'a> {
    /// Create an engine backed by the given segmenter.
    pub fn new(segmenter: &'a Segmenter) -> Self {
        Self { segmenter }
    }

    /// Repair every line of a document in place.
    pub fn repair_lines(&self, lines: &mut [Line]) {
        let mut changed = 0;
        for line in lines.iter_mut() {
            if self.repair_line(line) {
                changed += 1;
            }
        }
        log::debug!("Repaired {} of {} lines", changed, lines.len());
    }

    /// Repair one line in place. Returns true if its text changed.
    pub fn repair_line(&self, line: &mut Line) -> bool {
        let repaired = self.repair_text(&line.text);
        let changed = repaired != line.text;

        line.word_count = repaired.split_whitespace().count();
        line.features = text_features(&repaired, line.word_count);
        line.text = repaired;

        changed
    }

    /// Repair a piece of text.
    pub fn repair_text(&self, text: &str) -> String {
        let text = normalize(text);
        let text = GLYPH_ID.replace_all(&text, " ");
        let text = split_camel_case(&text);

        let parts: Vec<String> = text
            .split_whitespace()
            .map(|part| self.repair_part(part))
            .collect();
        parts.join(" ")
    }

    /// Segment the long alphabetic runs of one whitespace-free part.
    fn repair_part(&self, part: &str) -> String {
        let mut out = String::with_capacity(part.len());

        for run in LETTER_RUNS.find_iter(part) {
            let run = run.as_str();
            let is_letters = run.bytes().all(|b| b.is_ascii_alphabetic());

            if !is_letters || run.len() <= MIN_SEGMENT_LEN || self.segmenter.contains(run) {
                out.push_str(run);
                continue;
            }

            // A split is only taken when every piece is a dictionary word.
            let words = self.segmenter.segment(run);
            if words.len() > 1 && words.iter().all(|w| self.segmenter.contains(w)) {
                out.push_str(&words.join(" "));
            } else {
                out.push_str(run);
            }
        }

        out
    }
}

impl Default for RepairEngine<'static> {
    fn default() -> Self {
        Self::new(segment::global())
    }
}

/// Unicode NFC plus ligature expansion.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push(c),
        }
    }
    out
}

/// Insert a space at every ASCII lowercase-to-uppercase boundary.
fn split_camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev_lower = false;

    for c in text.chars() {
        if prev_lower && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
        prev_lower = c.is_ascii_lowercase();
    }

    out
}

/// Character-class features of repaired text.
///
/// Ratios are taken over all characters, spaces included, and are zero for
/// empty text.
pub fn text_features(text: &str, word_count: usize) -> TextFeatures {
    let mut chars = 0usize;
    let mut alpha = 0usize;
    let mut digits = 0usize;
    let mut symbols = 0usize;
    let mut has_math_symbol = false;

    for c in text.chars() {
        chars += 1;
        if c.is_alphabetic() {
            alpha += 1;
        }
        if c.is_numeric() {
            digits += 1;
        }
        if !c.is_alphanumeric() && !c.is_whitespace() {
            symbols += 1;
        }
        if MATH_SYMBOLS.contains(c) {
            has_math_symbol = true;
        }
    }

    let ratio = |n: usize| if chars == 0 { 0.0 } else { n as f64 / chars as f64 };
    let trimmed = text.trim();

    TextFeatures {
        is_tiny: word_count <= 2,
        is_numeric_only: !trimmed.is_empty() && trimmed.chars().all(char::is_numeric),
        alpha_ratio: ratio(alpha),
        digit_ratio: ratio(digits),
        symbol_ratio: ratio(symbols),
        has_math_symbol,
    }
}
