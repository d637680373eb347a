//! Line classifiers.
//!
//! A classifier is a pure function from a [`FeatureVector`] to a [`Label`].
//! Training happens elsewhere; this module loads the exported random-forest
//! artifact and evaluates it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ClassifiedLine, Label, Line};

use super::features::{feature_names, FeatureVector, FEATURE_COUNT};
use super::Insights;

/// Maps a feature vector to a label.
pub trait Classifier: Send + Sync {
    /// Predict the label of one line.
    fn predict(&self, features: &FeatureVector) -> Label;
}

impl<F> Classifier for F
where
    F: Fn(&FeatureVector) -> Label + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Label {
        self(features)
    }
}

/// Classify every line of a document.
pub fn classify_lines<C: Classifier + ?Sized>(
    classifier: &C,
    lines: &[Line],
    insights: &Insights,
) -> Vec<ClassifiedLine> {
    lines
        .iter()
        .map(|line| {
            let features = FeatureVector::from_line(line, insights);
            ClassifiedLine::new(line.clone(), classifier.predict(&features))
        })
        .collect()
}

/// Marker for leaf nodes in the flat tree arrays.
const LEAF: i64 = -1;

/// One decision tree in flat-array form.
///
/// Node `i` tests `features[feature[i]] <= threshold[i]` and continues at
/// `children_left[i]` when true, `children_right[i]` otherwise. Leaves have
/// both children set to -1 and carry per-class weights in `value[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Left child per node, or -1 for a leaf
    pub children_left: Vec<i64>,
    /// Right child per node, or -1 for a leaf
    pub children_right: Vec<i64>,
    /// Feature index tested at each split node
    pub feature: Vec<i64>,
    /// Split threshold per node (ignored at leaves)
    pub threshold: Vec<f64>,
    /// Per-class weights per node, one entry per class
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    fn validate(&self, index: usize, classes: usize) -> Result<()> {
        let n = self.node_count();
        let invalid = |reason: String| Error::InvalidModel(format!("tree {}: {}", index, reason));

        if n == 0 {
            return Err(invalid("has no nodes".to_string()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(invalid("node arrays have different lengths".to_string()));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(invalid(format!("node {} has a single child", node)));
                }
                let value = &self.value[node];
                if value.len() != classes {
                    return Err(invalid(format!(
                        "leaf {} has {} class weights, expected {}",
                        node,
                        value.len(),
                        classes
                    )));
                }
                if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(format!("leaf {} has a negative weight", node)));
                }
                continue;
            }

            // Children must point forward so traversal always terminates.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(invalid(format!(
                        "node {} has out-of-range child {}",
                        node, child
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(invalid(format!(
                    "node {} splits on unknown feature {}",
                    node, feature
                )));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("node {} has a NaN threshold", node)));
            }
        }

        Ok(())
    }

    /// Leaf class weights reached by a feature vector.
    fn leaf(&self, features: &FeatureVector) -> &[f64] {
        let mut node = 0;
        while !self.is_leaf(node) {
            let value = features.0[self.feature[node] as usize];
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

/// A random-forest classifier artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Label name to class index
    pub label_map: BTreeMap<String, usize>,

    /// Feature names the forest was trained on
    pub feature_order: Vec<String>,

    /// The trees of the forest
    pub trees: Vec<DecisionTree>,

    /// Class index to label, derived from `label_map`
    #[serde(skip)]
    classes: Vec<Label>,
}

impl ForestModel {
    /// Create and validate a model.
    pub fn new(label_map: BTreeMap<String, usize>, trees: Vec<DecisionTree>) -> Result<Self> {
        let mut model = Self {
            label_map,
            feature_order: feature_names(),
            trees,
            classes: Vec::new(),
        };
        model.prepare()?;
        Ok(model)
    }

    /// Parse a model from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut model: Self = serde_json::from_str(json)?;
        model.prepare()?;
        Ok(model)
    }

    /// Load a model from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let model = Self::from_json(&json)?;
        log::info!(
            "Loaded classifier with {} trees from {}",
            model.trees.len(),
            path.display()
        );
        Ok(model)
    }

    /// Serialize the model as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Number of trees.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities, indexed by class.
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(features);
            let sum: f64 = leaf.iter().sum();
            if sum <= 0.0 {
                continue;
            }
            for (total, weight) in totals.iter_mut().zip(leaf) {
                *total += weight / sum;
            }
        }
        let n = self.trees.len() as f64;
        totals.iter_mut().for_each(|t| *t /= n);
        totals
    }

    fn prepare(&mut self) -> Result<()> {
        let expected = feature_names();
        if self.feature_order != expected {
            return Err(Error::FeatureOrderMismatch {
                expected,
                found: self.feature_order.clone(),
            });
        }

        let mut classes: Vec<Option<Label>> = vec![None; self.label_map.len()];
        for (name, &index) in &self.label_map {
            let label = Label::parse(name)
                .ok_or_else(|| Error::InvalidModel(format!("unknown label {:?}", name)))?;
            match classes.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(label),
                _ => {
                    return Err(Error::InvalidModel(format!(
                        "label index {} is out of range or duplicated",
                        index
                    )))
                }
            }
        }
        // Every slot is filled: indices are unique and below the map size.
        self.classes = classes.into_iter().flatten().collect();
        if self.classes.is_empty() {
            return Err(Error::InvalidModel("label map is empty".to_string()));
        }

        if self.trees.is_empty() {
            return Err(Error::InvalidModel("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.classes.len())?;
        }

        Ok(())
    }
}

impl Classifier for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Label {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}
