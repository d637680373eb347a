//! Dictionary-based word segmentation.
//!
//! Splits run-on text such as `"thequickbrown"` into the most probable
//! sequence of words under a unigram language model. Unknown words are
//! penalised by length so the segmenter prefers dictionary words but can
//! still leave an unknown token intact.
//!
//! The dictionary is process-wide and immutable once installed: call
//! [`install`] at start-up to use a custom table, otherwise [`global`]
//! falls back to the built-in English table.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

/// Built-in unigram table, `word<TAB>count` per line.
const BUILTIN_UNIGRAMS: &str = include_str!("../../data/unigrams.txt");

/// Longest candidate word considered during segmentation.
const MAX_WORD_LEN: usize = 24;

static GLOBAL: OnceCell<Segmenter> = OnceCell::new();

/// Install the process-wide segmenter.
///
/// Must happen before the first call to [`global`]; afterwards the
/// dictionary is fixed for the life of the process.
pub fn install(segmenter: Segmenter) -> Result<()> {
    GLOBAL
        .set(segmenter)
        .map_err(|_| Error::SegmenterInitialized)
}

/// The process-wide segmenter, initialising the built-in table on first use.
pub fn global() -> &'static Segmenter {
    GLOBAL.get_or_init(|| {
        let segmenter = Segmenter::builtin();
        log::debug!("Loaded built-in dictionary with {} words", segmenter.len());
        segmenter
    })
}

/// Unigram word segmenter.
#[derive(Debug, Clone)]
pub struct Segmenter {
    unigrams: HashMap<String, u64>,
    log_total: f64,
}

impl Segmenter {
    /// Build a segmenter from `(word, count)` pairs.
    ///
    /// Words are lowercased; repeated words have their counts summed.
    pub fn from_counts<I, S>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut unigrams: HashMap<String, u64> = HashMap::new();
        for (word, count) in counts {
            if count == 0 {
                continue;
            }
            *unigrams.entry(word.as_ref().to_lowercase()).or_insert(0) += count;
        }

        let total: u64 = unigrams.values().sum();
        if total == 0 {
            return Err(Error::InvalidDictionary {
                line: 0,
                reason: "dictionary has no words with a positive count".to_string(),
            });
        }

        Ok(Self {
            unigrams,
            log_total: (total as f64).log10(),
        })
    }

    /// Parse a `word<TAB>count` table. Blank lines and `#` comments are skipped.
    pub fn parse(source: &str) -> Result<Self> {
        let mut counts = Vec::new();

        for (i, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let (word, count) = match (fields.next(), fields.next(), fields.next()) {
                (Some(word), Some(count), None) => (word, count),
                _ => {
                    return Err(Error::InvalidDictionary {
                        line: i + 1,
                        reason: "expected `word<TAB>count`".to_string(),
                    })
                }
            };
            let count: u64 = count.parse().map_err(|_| Error::InvalidDictionary {
                line: i + 1,
                reason: format!("invalid count {:?}", count),
            })?;

            counts.push((word, count));
        }

        Self::from_counts(counts)
    }

    /// Load a `word<TAB>count` table from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// The built-in English table.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_UNIGRAMS).expect("built-in dictionary is well-formed")
    }

    /// Number of distinct dictionary words.
    pub fn len(&self) -> usize {
        self.unigrams.len()
    }

    /// Check if the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.unigrams.is_empty()
    }

    /// Check if a word (any case) is in the dictionary.
    pub fn contains(&self, word: &str) -> bool {
        self.unigrams.contains_key(&word.to_lowercase())
    }

    /// Log10 probability of a single lowercase word.
    fn score(&self, word: &str) -> f64 {
        match self.unigrams.get(word) {
            Some(&count) => (count as f64).log10() - self.log_total,
            // Unknown words get 10 / (total * 10^len).
            None => 1.0 - self.log_total - word.len() as f64,
        }
    }

    /// Split text into its most probable word sequence.
    ///
    /// The input is lowercased and reduced to ASCII letters and digits;
    /// the returned words are lowercase. Empty input yields no words.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let clean: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let n = clean.len();
        if n == 0 {
            return Vec::new();
        }

        let mut best = vec![f64::NEG_INFINITY; n + 1];
        let mut split_at = vec![0usize; n + 1];
        best[0] = 0.0;

        for end in 1..=n {
            for start in end.saturating_sub(MAX_WORD_LEN)..end {
                let candidate = best[start] + self.score(&clean[start..end]);
                if candidate > best[end] {
                    best[end] = candidate;
                    split_at[end] = start;
                }
            }
        }

        let mut words = Vec::new();
        let mut end = n;
        while end > 0 {
            let start = split_at[end];
            words.push(clean[start..end].to_string());
            end = start;
        }
        words.reverse();
        words
    }
}
