//! Positioned word tokens handed over by a source.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A word with its vertical position and font, as produced by a parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The word text
    pub text: String,

    /// Distance from the top of the page in layout units
    pub top: f32,

    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,

    /// Font size in points
    pub font_size: f32,
}

impl Word {
    /// Create a new word token.
    pub fn new(text: impl Into<String>, top: f32, font_name: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            top,
            font_name: font_name.into(),
            font_size,
        }
    }

    /// Check the token against the input contract of the line aggregator.
    pub fn validate(&self, page: usize) -> Result<()> {
        let reason = if self.text.trim().is_empty() {
            "empty text"
        } else if !self.top.is_finite() {
            "non-finite top"
        } else if !self.font_size.is_finite() || self.font_size < 0.0 {
            "invalid font size"
        } else {
            return Ok(());
        };

        Err(Error::MalformedWord {
            page,
            reason: format!("{} ({:?})", reason, self.text),
        })
    }
}

/// Validate every word of every page before aggregation.
pub fn validate_pages(pages: &[Vec<Word>]) -> Result<()> {
    for (page, words) in pages.iter().enumerate() {
        for word in words {
            word.validate(page)?;
        }
    }
    Ok(())
}
