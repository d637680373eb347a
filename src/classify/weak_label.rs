//! Rule-based silver labels and label artifacts.
//!
//! The weak labeler only bootstraps training data. Its output is expected to
//! contain errors and is never used at inference time.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Label, Line};

use super::Insights;

/// Rule-based heading/paragraph labeler.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakLabeler;

impl WeakLabeler {
    /// Create a new labeler.
    pub fn new() -> Self {
        Self
    }

    /// Label one line. Rules are tried in order; paragraph is the fallback.
    pub fn label(&self, line: &Line, insights: &Insights) -> Label {
        if Self::is_paragraph(line, insights) {
            return Label::Paragraph;
        }
        if Self::is_heading(line, insights) {
            return Label::Heading;
        }
        Label::Paragraph
    }

    /// Label every line of a document, keyed by line key.
    pub fn label_lines(&self, lines: &[Line], insights: &Insights) -> LabelSet {
        let mut set = LabelSet::new();
        for line in lines {
            set.insert(line.key(), self.label(line, insights));
        }
        log::debug!(
            "Weak labels: {} headings out of {} lines",
            set.count(Label::Heading),
            set.len()
        );
        set
    }

    fn is_paragraph(line: &Line, insights: &Insights) -> bool {
        let wc = line.word_count;

        // Long text
        if wc >= 12 {
            return true;
        }

        // Sentence-like
        if wc >= 8 && line.ends_with_punctuation {
            return true;
        }

        // Body typography at a reasonable length
        let body_font = insights
            .paragraph_font
            .as_deref()
            .map_or(false, |font| line.has_font(font));
        let body_size = insights
            .paragraph_size
            .map_or(false, |size| line.has_size(size));
        body_font && body_size && wc >= 6
    }

    fn is_heading(line: &Line, insights: &Insights) -> bool {
        if line.word_count > 6 || line.ends_with_punctuation {
            return false;
        }

        match (line.median_font_size(), insights.paragraph_size) {
            (Some(size), Some(body)) => size > 0.0 && size > body.points(),
            _ => false,
        }
    }
}

/// Labels of one document, keyed by `"<page_index>_<line_index>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: BTreeMap<String, String>,
}

impl LabelSet {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label of a line key.
    pub fn insert(&mut self, key: impl Into<String>, label: Label) {
        self.labels.insert(key.into(), label.as_str().to_string());
    }

    /// Label of a line key.
    ///
    /// Returns `None` both for missing keys and for label names this crate
    /// does not know, such as hand-edited `"UNLABELED"` entries.
    pub fn get(&self, key: &str) -> Option<Label> {
        self.labels.get(key).and_then(|name| Label::parse(name))
    }

    /// Raw label string of a line key.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Label of a line.
    pub fn label_of(&self, line: &Line) -> Option<Label> {
        self.get(&line.key())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if no labels are stored.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of entries with the given label.
    pub fn count(&self, label: Label) -> usize {
        self.labels.values().filter(|v| *v == label.as_str()).count()
    }

    /// Iterate over `(key, raw label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Label sets of many documents, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelStore {
    documents: BTreeMap<String, LabelSet>,
}

impl LabelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the labels of a document.
    pub fn insert(&mut self, document: impl Into<String>, labels: LabelSet) {
        self.documents.insert(document.into(), labels);
    }

    /// Labels of a document.
    pub fn get(&self, document: &str) -> Option<&LabelSet> {
        self.documents.get(document)
    }

    /// Labels of the document at `path`, looked up by its file name.
    pub fn for_path<P: AsRef<Path>>(&self, path: P) -> Option<&LabelSet> {
        let name = path.as_ref().file_name()?.to_str()?;
        self.get(name)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterate over documents.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelSet)> {
        self.documents.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a store from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a store from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the store as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the store to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
