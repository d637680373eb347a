//! Classifier quality against reference labels.

use serde::Serialize;

use crate::model::{ClassifiedLine, Label};

use super::weak_label::LabelSet;

const CLASSES: usize = Label::ALL.len();

/// Precision, recall and F1 of one label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelScore {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Reference lines carrying this label
    pub support: usize,
}

/// Confusion matrix of predicted vs reference labels.
///
/// `matrix[reference][predicted]`, indexed by [`Label::index`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub matrix: [[usize; CLASSES]; CLASSES],
    /// Predicted lines with no usable reference label
    pub skipped: usize,
}

impl Evaluation {
    /// Create an empty evaluation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction.
    pub fn record(&mut self, reference: Label, predicted: Label) {
        self.matrix[reference.index()][predicted.index()] += 1;
    }

    /// Compare a document's predictions with its reference labels.
    pub fn add_document(&mut self, predicted: &[ClassifiedLine], reference: &LabelSet) {
        for line in predicted {
            match reference.label_of(&line.line) {
                Some(label) => self.record(label, line.label),
                None => self.skipped += 1,
            }
        }
    }

    /// Merge another evaluation into this one.
    pub fn merge(&mut self, other: &Evaluation) {
        for (row, other_row) in self.matrix.iter_mut().zip(&other.matrix) {
            for (cell, other_cell) in row.iter_mut().zip(other_row) {
                *cell += other_cell;
            }
        }
        self.skipped += other.skipped;
    }

    /// Number of compared lines.
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Fraction of compared lines predicted correctly; 0 when nothing was compared.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..CLASSES).map(|i| self.matrix[i][i]).sum();
        correct as f64 / total as f64
    }

    /// Scores of one label. Undefined ratios are reported as 0.
    pub fn score(&self, label: Label) -> LabelScore {
        let i = label.index();
        let tp = self.matrix[i][i];
        let predicted: usize = (0..CLASSES).map(|r| self.matrix[r][i]).sum();
        let support: usize = self.matrix[i].iter().sum();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        LabelScore {
            label,
            precision,
            recall,
            f1,
            support,
        }
    }

    /// Scores of every label in class-index order.
    pub fn scores(&self) -> Vec<LabelScore> {
        Label::ALL.iter().map(|label| self.score(*label)).collect()
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}
