//! Training data export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Label, Line};

use super::features::{feature_names, FeatureVector};
use super::weak_label::LabelSet;
use super::Insights;

/// One labelled line for the external trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Line key, `"<page_index>_<line_index>"`
    pub key: String,
    /// Feature vector in contract order
    pub features: FeatureVector,
    /// Label name
    pub label: Label,
    /// Class index of the label
    pub label_index: usize,
}

/// Labelled samples plus the metadata a trainer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature names in vector order
    pub feature_order: Vec<String>,
    /// Label name to class index
    pub label_map: BTreeMap<String, usize>,
    /// Samples in document order
    pub samples: Vec<TrainingSample>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self {
            feature_order: feature_names(),
            label_map: Label::ALL
                .iter()
                .map(|label| (label.as_str().to_string(), label.index()))
                .collect(),
            samples: Vec::new(),
        }
    }

    /// Add the labelled lines of one document.
    ///
    /// Lines without a label, or with a label name that is not known, are
    /// skipped. Returns the number of samples added.
    pub fn add_document(&mut self, lines: &[Line], insights: &Insights, labels: &LabelSet) -> usize {
        let before = self.samples.len();

        for line in lines {
            let key = line.key();
            let Some(label) = labels.get(&key) else {
                continue;
            };
            self.samples.push(TrainingSample {
                features: FeatureVector::from_line(line, insights),
                label_index: label.index(),
                label,
                key,
            });
        }

        let added = self.samples.len() - before;
        log::debug!("Added {} of {} lines to dataset", added, lines.len());
        added
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples per label, in class-index order.
    pub fn class_counts(&self) -> Vec<(Label, usize)> {
        Label::ALL
            .iter()
            .map(|label| {
                let n = self.samples.iter().filter(|s| s.label == *label).count();
                (*label, n)
            })
            .collect()
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}
