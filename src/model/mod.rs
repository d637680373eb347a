//! Document model types shared by every pipeline stage.
//!
//! Words come in from a source, lines are built and repaired by the parser,
//! labels are attached by a classifier, and sections/chunks leave through
//! the renderer.

mod label;
mod line;
mod section;
mod word;

pub use label::{ClassifiedLine, Label};
pub use line::{count_items, line_key, Line, LineLayout, SizeKey, TextFeatures};
pub use section::{Chunk, ChunkedSection, Section};
pub use word::{validate_pages, Word};
