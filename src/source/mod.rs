//! Line sources: the boundary to document parsers.
//!
//! A source turns a document into unrepaired [`Line`]s. Sources are
//! registered by file extension and dispatched through a [`SourceRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use sectionize::parser::LineAggregator;
//! use sectionize::source::SourceRegistry;
//! use std::path::Path;
//!
//! fn main() -> sectionize::Result<()> {
//!     let registry = SourceRegistry::with_defaults();
//!     let lines = registry.extract(Path::new("paper.pdf"), &LineAggregator::default())?;
//!     println!("{} lines", lines.len());
//!     Ok(())
//! }
//! ```

mod docx;
mod pdf;

pub use docx::{parse_document_xml, DocxParagraph, DocxRun, DocxSource, UNKNOWN_FONT};
pub use pdf::PdfSource;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Line;
use crate::parser::LineAggregator;

/// A document format that can produce lines.
///
/// Implement this trait to add support for a new document format.
pub trait LineSource: Send + Sync {
    /// Supported file extensions, lowercase without the leading dot.
    fn supported_extensions(&self) -> &[&str];

    /// Name of this source.
    fn name(&self) -> &str;

    /// Extract lines from document bytes.
    fn extract_bytes(&self, bytes: &[u8], aggregator: &LineAggregator) -> Result<Vec<Line>>;

    /// Extract lines from a file.
    fn extract(&self, path: &Path, aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let bytes = std::fs::read(path)?;
        self.extract_bytes(&bytes, aggregator)
    }

    /// Check if this source supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry of line sources keyed by extension.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn LineSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Create a registry with the PDF and DOCX sources.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfSource::new()));
        registry.register(Arc::new(DocxSource::new()));
        registry
    }

    /// Register a source for all of its extensions.
    pub fn register(&mut self, source: Arc<dyn LineSource>) {
        for ext in source.supported_extensions() {
            self.sources.insert(ext.to_lowercase(), source.clone());
        }
    }

    /// Source for an extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LineSource>> {
        self.sources.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.sources.contains_key(&ext.to_lowercase())
    }

    /// All supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.sources.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Source for a path, by its extension.
    pub fn source_for(&self, path: &Path) -> Result<Arc<dyn LineSource>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        self.get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(ext.to_string()))
    }

    /// Extract lines from a file with the matching source.
    pub fn extract(&self, path: &Path, aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let source = self.source_for(path)?;
        log::debug!("Extracting {} with {} source", path.display(), source.name());
        source.extract(path, aggregator)
    }

    /// Extract lines from bytes, choosing the source by extension.
    pub fn extract_bytes(&self, bytes: &[u8], ext: &str, aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let source = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::UnsupportedFormat(ext.to_string()))?;
        source.extract_bytes(bytes, aggregator)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("extensions", &self.supported_extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_with_defaults() {
        let registry = SourceRegistry::with_defaults();
        assert!(registry.supports("pdf"));
        assert!(registry.supports("DOCX"));
        assert!(!registry.supports("doc"));
        assert_eq!(registry.supported_extensions(), vec!["docx", "pdf"]);
    }

    #[test]
    fn test_registry_get_by_extension() {
        let registry = SourceRegistry::with_defaults();
        assert_eq!(registry.get_by_extension("PDF").unwrap().name(), "pdf");
        assert!(registry.get_by_extension("txt").is_none());
    }

    #[test]
    fn test_unsupported_paths() {
        let registry = SourceRegistry::with_defaults();
        let aggregator = LineAggregator::default();

        let err = registry.extract(Path::new("notes.txt"), &aggregator).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref e) if e == "txt"));

        let err = registry.extract(Path::new("README"), &aggregator).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
