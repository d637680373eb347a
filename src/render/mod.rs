//! Rendering classified lines into sections, chunks and JSON.

mod json;
mod sections;

pub use json::{to_json, to_json_value, JsonFormat};
pub use sections::{chunk_words, join_content, SectionAssembler};
