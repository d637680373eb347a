//! Reconstructed visual lines.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static BULLET_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[•●▪■→]").unwrap());
static NUMBERED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]").unwrap());

/// A font size quantized to 0.1pt, used as a statistics key.
///
/// Sizes are compared by their rounded value so that 11.96 and 12.04 both
/// count as 12.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeKey(i32);

impl SizeKey {
    /// Quantize a point size to one decimal place.
    pub fn from_points(size: f32) -> Self {
        Self((size * 10.0).round() as i32)
    }

    /// The quantized size in points.
    pub fn points(&self) -> f32 {
        self.0 as f32 / 10.0
    }
}

impl From<f32> for SizeKey {
    fn from(size: f32) -> Self {
        Self::from_points(size)
    }
}

impl std::fmt::Display for SizeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.points())
    }
}

// Rendered as text so that it works both as a JSON value and a JSON map key.
impl Serialize for SizeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Position of a line on its page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LineLayout {
    /// Vertical position of the line's first word
    pub top: f32,
}

/// Character-level features attached by the text repair engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TextFeatures {
    /// Two words or fewer
    pub is_tiny: bool,
    /// Nothing but digits after trimming
    pub is_numeric_only: bool,
    /// Alphabetic characters over all characters
    pub alpha_ratio: f64,
    /// Numeric characters over all characters
    pub digit_ratio: f64,
    /// Non-alphanumeric, non-space characters over all characters
    pub symbol_ratio: f64,
    /// Contains at least one character from the math symbol set
    pub has_math_symbol: bool,
}

/// A visual text line: the unit every later stage works on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Line text (rewritten once by the repair engine)
    pub text: String,

    /// Document-wide index, contiguous across pages
    pub line_index: usize,

    /// 0-based page index
    pub page_index: usize,

    /// Layout information
    pub layout: LineLayout,

    /// Whitespace-delimited word count
    pub word_count: usize,

    /// Font size occurrences within the line, in first-seen order
    pub size_stats: IndexMap<SizeKey, u32>,

    /// Font name occurrences within the line, in first-seen order
    pub style_stats: IndexMap<String, u32>,

    /// Contains a bullet or arrow glyph
    pub has_symbol: bool,

    /// Starts with a list/section number such as "2." or "3)"
    pub starts_with_number: bool,

    /// Ends with '.', '!' or '?'
    pub ends_with_punctuation: bool,

    /// Repair-stage features; all zero until the repair engine runs
    #[serde(flatten)]
    pub features: TextFeatures,
}

impl Line {
    /// Seal a line: derive word count and layout flags from its text.
    pub fn new(
        text: impl Into<String>,
        line_index: usize,
        page_index: usize,
        top: f32,
        size_stats: IndexMap<SizeKey, u32>,
        style_stats: IndexMap<String, u32>,
    ) -> Self {
        let text = text.into();
        Self {
            word_count: text.split_whitespace().count(),
            has_symbol: has_symbol(&text),
            starts_with_number: starts_with_number(&text),
            ends_with_punctuation: ends_with_punctuation(&text),
            text,
            line_index,
            page_index,
            layout: LineLayout { top },
            size_stats,
            style_stats,
            features: TextFeatures::default(),
        }
    }

    /// Key used by label artifacts: `"<page_index>_<line_index>"`.
    pub fn key(&self) -> String {
        line_key(self.page_index, self.line_index)
    }

    /// Median font size of the line, weighting each size by its count.
    ///
    /// Returns `None` when the line has no size information.
    pub fn median_font_size(&self) -> Option<f32> {
        let mut sizes: Vec<f32> = self
            .size_stats
            .iter()
            .flat_map(|(size, count)| std::iter::repeat(size.points()).take(*count as usize))
            .collect();
        if sizes.is_empty() {
            return None;
        }
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mid = sizes.len() / 2;
        if sizes.len() % 2 == 1 {
            Some(sizes[mid])
        } else {
            Some((sizes[mid - 1] + sizes[mid]) / 2.0)
        }
    }

    /// Check whether the line used the given font size.
    pub fn has_size(&self, size: SizeKey) -> bool {
        self.size_stats.contains_key(&size)
    }

    /// Check whether the line used the given font.
    pub fn has_font(&self, font: &str) -> bool {
        self.style_stats.contains_key(font)
    }
}

/// Build a label key from page and line indices.
pub fn line_key(page_index: usize, line_index: usize) -> String {
    format!("{}_{}", page_index, line_index)
}

/// Count items in first-seen order.
pub fn count_items<K, I>(items: I) -> IndexMap<K, u32>
where
    K: std::hash::Hash + Eq,
    I: IntoIterator<Item = K>,
{
    let mut stats = IndexMap::new();
    for item in items {
        *stats.entry(item).or_insert(0) += 1;
    }
    stats
}

fn has_symbol(text: &str) -> bool {
    BULLET_SYMBOL.is_match(text)
}

fn starts_with_number(text: &str) -> bool {
    NUMBERED_PREFIX.is_match(text.trim())
}

fn ends_with_punctuation(text: &str) -> bool {
    text.trim().ends_with(['.', '!', '?'])
}
