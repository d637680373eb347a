//! Error types for the sectionize library.

use std::io;
use thiserror::Error;

/// Result type alias for sectionize operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting and structuring a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension has no registered line source.
    #[error("Unsupported file type: {0} (only .pdf and .docx are accepted)")]
    UnsupportedFormat(String),

    /// The file content does not match its declared format.
    #[error("Unknown file format: content is not a valid {0}")]
    UnknownFormat(&'static str),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Error reading a DOCX container or its XML parts.
    #[error("DOCX parsing error: {0}")]
    DocxParse(String),

    /// A word token handed over by a source violates the input contract.
    #[error("Malformed word on page {page}: {reason}")]
    MalformedWord {
        /// 0-based page index of the offending word
        page: usize,
        /// What was wrong with it
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The classifier artifact is structurally invalid.
    #[error("Invalid classifier model: {0}")]
    InvalidModel(String),

    /// The classifier was trained on a different feature layout.
    #[error("Feature order mismatch: expected {expected:?}, found {found:?}")]
    FeatureOrderMismatch {
        /// Feature names this crate produces
        expected: Vec<String>,
        /// Feature names stored in the artifact
        found: Vec<String>,
    },

    /// Structuring was requested but no classifier is configured.
    #[error("No classifier configured; load a model before structuring documents")]
    MissingClassifier,

    /// The segmentation dictionary could not be parsed.
    #[error("Invalid dictionary at line {line}: {reason}")]
    InvalidDictionary {
        /// 1-based line number in the dictionary source
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// The process-wide segmenter was already installed.
    #[error("Word segmenter is already initialized")]
    SegmenterInitialized,

    /// Pipeline options are out of range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::DocxParse(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::DocxParse(err.to_string())
    }
}
