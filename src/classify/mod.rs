//! Line classification.
//!
//! Typography insights are computed once per document, then every line is
//! mapped to a [`FeatureVector`] and labelled by a [`Classifier`]. The weak
//! labeler, dataset export and evaluation support offline training.

mod dataset;
mod eval;
mod features;
mod insights;
mod model;
mod weak_label;

pub use dataset::{Dataset, TrainingSample};
pub use eval::{Evaluation, LabelScore};
pub use features::{feature_names, FeatureVector, FEATURE_COUNT, FEATURE_ORDER, NOMINAL_PAGE_HEIGHT};
pub use insights::{Insights, TypographyStats, MIN_TEXT_SIZE};
pub use model::{classify_lines, Classifier, DecisionTree, ForestModel};
pub use weak_label::{LabelSet, LabelStore, WeakLabeler};
