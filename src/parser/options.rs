//! Pipeline options and configuration.

use crate::error::{Error, Result};

/// Default vertical tolerance, in layout units, for words on the same line.
pub const DEFAULT_LINE_THRESHOLD: f32 = 2.0;

/// Default maximum number of words per chunk.
pub const DEFAULT_MAX_WORDS: usize = 400;

/// Options for extracting and structuring documents.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum `top` distance between a word and its line's first word
    pub line_threshold: f32,

    /// Maximum words per output chunk
    pub max_words: usize,

    /// Whether batches of documents are processed in parallel
    pub parallel: bool,
}

impl PipelineOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line grouping threshold.
    pub fn with_line_threshold(mut self, threshold: f32) -> Self {
        self.line_threshold = threshold;
        self
    }

    /// Set the chunk size in words.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.line_threshold.is_finite() || self.line_threshold < 0.0 {
            return Err(Error::InvalidOptions(format!(
                "line threshold must be a finite, non-negative number (got {})",
                self.line_threshold
            )));
        }
        if self.max_words == 0 {
            return Err(Error::InvalidOptions(
                "max words per chunk must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            line_threshold: DEFAULT_LINE_THRESHOLD,
            max_words: DEFAULT_MAX_WORDS,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = PipelineOptions::new()
            .with_line_threshold(3.5)
            .with_max_words(128)
            .sequential();

        assert_eq!(options.line_threshold, 3.5);
        assert_eq!(options.max_words, 128);
        assert!(!options.parallel);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = PipelineOptions::default();
        assert_eq!(options.line_threshold, 2.0);
        assert_eq!(options.max_words, 400);
        assert!(options.parallel);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(PipelineOptions::new().with_max_words(0).validate().is_err());
        assert!(PipelineOptions::new()
            .with_line_threshold(f32::NAN)
            .validate()
            .is_err());
        assert!(PipelineOptions::new()
            .with_line_threshold(-1.0)
            .validate()
            .is_err());
    }
}
