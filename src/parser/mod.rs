//! Line reconstruction and text repair.

mod aggregate;
mod options;
mod repair;
pub mod segment;

pub use aggregate::LineAggregator;
pub use options::{PipelineOptions, DEFAULT_LINE_THRESHOLD, DEFAULT_MAX_WORDS};
pub use repair::{text_features, RepairEngine};
pub use segment::Segmenter;
