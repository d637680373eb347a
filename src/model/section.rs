//! Sections and retrieval chunks.

use serde::{Deserialize, Serialize};

/// A heading with the paragraph lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Section heading (possibly several heading lines joined with spaces)
    pub heading: String,

    /// Paragraph lines in document order
    pub content: Vec<String>,
}

impl Section {
    /// Heading used when body text appears before any heading.
    pub const INTRO: &'static str = "INTRO";

    /// Create an empty section.
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            content: Vec::new(),
        }
    }

    /// Check if the section has no content lines.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A bounded slice of a section's joined text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position within the section
    pub chunk_id: usize,

    /// Chunk text, words separated by single spaces
    pub content: String,
}

impl Chunk {
    /// Number of words in the chunk.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// A section in its output form: heading plus chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkedSection {
    /// Section heading
    pub heading: String,

    /// Chunks in reading order
    pub chunks: Vec<Chunk>,
}

impl ChunkedSection {
    /// Total word count across all chunks.
    pub fn word_count(&self) -> usize {
        self.chunks.iter().map(Chunk::word_count).sum()
    }
}
