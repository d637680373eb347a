//! JSON rendering for structured documents.

use serde::Serialize;

use crate::error::Result;
use crate::model::ChunkedSection;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert structured sections to JSON.
pub fn to_json(sections: &[ChunkedSection], format: JsonFormat) -> Result<String> {
    to_json_value(sections, format)
}

/// Convert any serializable artifact to JSON.
pub fn to_json_value<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}
