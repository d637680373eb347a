//! Line reconstruction from positioned words.
//!
//! Words arrive in reading order. A word joins the open line while its `top`
//! stays within the threshold of the line's *first* word; otherwise the line
//! is sealed and a new one starts. Line indices run across pages without gaps.

use indexmap::IndexMap;

use crate::model::{Line, SizeKey, Word};

use super::options::DEFAULT_LINE_THRESHOLD;

/// Groups words into visual lines.
#[derive(Debug, Clone, Copy)]
pub struct LineAggregator {
    threshold: f32,
}

impl LineAggregator {
    /// Create an aggregator with the given vertical threshold.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// The vertical threshold in layout units.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Build the lines of one page.
    ///
    /// `next_index` is the first free line index; the updated counter is
    /// returned with the lines. An empty page leaves the counter unchanged.
    pub fn aggregate_page(
        &self,
        words: &[Word],
        page_index: usize,
        next_index: usize,
    ) -> (Vec<Line>, usize) {
        let mut lines = Vec::new();
        let mut line_index = next_index;
        let mut current: Option<OpenLine> = None;

        for word in words {
            if let Some(open) = current.as_mut() {
                if (word.top - open.top).abs() <= self.threshold {
                    open.push(word);
                    continue;
                }
            }

            if let Some(open) = current.take() {
                lines.push(open.seal(line_index, page_index));
                line_index += 1;
            }
            current = Some(OpenLine::start(word));
        }

        if let Some(open) = current {
            lines.push(open.seal(line_index, page_index));
            line_index += 1;
        }

        log::debug!(
            "Page {}: {} words -> {} lines",
            page_index,
            words.len(),
            lines.len()
        );

        (lines, line_index)
    }

    /// Build the lines of a whole document, one word list per page.
    pub fn aggregate_document(&self, pages: &[Vec<Word>]) -> Vec<Line> {
        let mut all_lines = Vec::new();
        let mut next_index = 0;

        for (page_index, words) in pages.iter().enumerate() {
            let (lines, updated) = self.aggregate_page(words, page_index, next_index);
            all_lines.extend(lines);
            next_index = updated;
        }

        all_lines
    }
}

impl Default for LineAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_THRESHOLD)
    }
}

/// Accumulator for the line being built.
struct OpenLine {
    text: String,
    top: f32,
    sizes: IndexMap<SizeKey, u32>,
    fonts: IndexMap<String, u32>,
}

impl OpenLine {
    fn start(word: &Word) -> Self {
        let mut line = Self {
            text: String::new(),
            top: word.top,
            sizes: IndexMap::new(),
            fonts: IndexMap::new(),
        };
        line.push(word);
        line
    }

    fn push(&mut self, word: &Word) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&word.text);

        // Repeated sizes/fonts within a line collapse to a single occurrence.
        self.sizes.entry(SizeKey::from_points(word.font_size)).or_insert(1);
        self.fonts.entry(word.font_name.clone()).or_insert(1);
    }

    fn seal(self, line_index: usize, page_index: usize) -> Line {
        Line::new(
            self.text,
            line_index,
            page_index,
            self.top,
            self.sizes,
            self.fonts,
        )
    }
}
