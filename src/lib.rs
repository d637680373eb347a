//! # sectionize
//!
//! Turns positioned words from PDF and DOCX documents into a hierarchy of
//! headings and bounded text chunks.
//!
//! The pipeline groups words into visual lines, repairs text damaged by
//! extraction, infers the document's body and heading typography, classifies
//! every line as heading or paragraph, and assembles the result into
//! sections split into chunks of at most `max_words` words.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sectionize::{ForestModel, Sectionizer};
//!
//! fn main() -> sectionize::Result<()> {
//!     let model = ForestModel::load("model.json")?;
//!     let sectionizer = Sectionizer::new().with_classifier(model);
//!
//!     for section in sectionizer.structure("paper.pdf")? {
//!         println!("{} ({} chunks)", section.heading, section.chunks.len());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **PDF and DOCX sources**: dispatched by file extension
//! - **Text repair**: glyph-id removal, camel-case splitting, word segmentation
//! - **Typography insights**: dominant body font and size per document
//! - **Weak labels**: rule-based heading labels for training data
//! - **Parallel batches**: uses Rayon for multi-document runs

pub mod classify;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use classify::{
    classify_lines, Classifier, Dataset, Evaluation, FeatureVector, ForestModel, Insights,
    LabelSet, LabelStore, WeakLabeler,
};
pub use detect::FileKind;
pub use error::{Error, Result};
pub use model::{
    Chunk, ChunkedSection, ClassifiedLine, Label, Line, LineLayout, Section, SizeKey,
    TextFeatures, Word,
};
pub use parser::{LineAggregator, PipelineOptions, RepairEngine, Segmenter};
pub use render::{JsonFormat, SectionAssembler};
pub use source::{LineSource, SourceRegistry};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

/// Extract repaired lines from a PDF or DOCX file with default options.
///
/// # Example
///
/// ```no_run
/// let lines = sectionize::extract_lines("paper.pdf").unwrap();
/// println!("Lines: {}", lines.len());
/// ```
pub fn extract_lines<P: AsRef<Path>>(path: P) -> Result<Vec<Line>> {
    Sectionizer::new().extract_lines(path)
}

/// Extract lines and typography insights from a file with default options.
pub fn analyze<P: AsRef<Path>>(path: P) -> Result<AnalyzedDocument> {
    Sectionizer::new().analyze(path)
}

/// Produce weak heading/paragraph labels for a file with default options.
pub fn weak_labels<P: AsRef<Path>>(path: P) -> Result<LabelSet> {
    Sectionizer::new().weak_labels(path)
}

/// Builder-style entry point for the whole pipeline.
///
/// # Example
///
/// ```no_run
/// use sectionize::{Label, Sectionizer};
///
/// // Any `Fn(&FeatureVector) -> Label` is a classifier.
/// let sectionizer = Sectionizer::new()
///     .with_max_words(200)
///     .sequential()
///     .with_classifier(|features: &sectionize::FeatureVector| {
///         if features.by_name("is_heading_size") == Some(1.0) {
///             Label::Heading
///         } else {
///             Label::Paragraph
///         }
///     });
///
/// let sections = sectionizer.structure("report.docx").unwrap();
/// ```
#[derive(Clone)]
pub struct Sectionizer {
    options: PipelineOptions,
    registry: SourceRegistry,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Sectionizer {
    /// Create a pipeline with default options and the built-in sources.
    pub fn new() -> Self {
        Self {
            options: PipelineOptions::default(),
            registry: SourceRegistry::with_defaults(),
            classifier: None,
        }
    }

    /// Replace all pipeline options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum number of words per chunk.
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.options = self.options.with_max_words(max_words);
        self
    }

    /// Set the vertical tolerance used to group words into lines.
    pub fn with_line_threshold(mut self, threshold: f32) -> Self {
        self.options = self.options.with_line_threshold(threshold);
        self
    }

    /// Process batches one document at a time.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Use a classifier for structuring.
    pub fn with_classifier<C: Classifier + 'static>(mut self, classifier: C) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Use an already shared classifier.
    pub fn with_shared_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Replace the source registry.
    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Current options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Source registry in use.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Whether a classifier is configured.
    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Extract and repair the lines of a file.
    pub fn extract_lines<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Line>> {
        self.options.validate()?;
        let aggregator = LineAggregator::new(self.options.line_threshold);
        let lines = self.registry.extract(path.as_ref(), &aggregator)?;
        Ok(repair(lines))
    }

    /// Extract and repair the lines of an in-memory document.
    ///
    /// `ext` selects the source, as a file extension would.
    pub fn extract_lines_bytes(&self, bytes: &[u8], ext: &str) -> Result<Vec<Line>> {
        self.options.validate()?;
        let aggregator = LineAggregator::new(self.options.line_threshold);
        let lines = self.registry.extract_bytes(bytes, ext, &aggregator)?;
        Ok(repair(lines))
    }

    /// Extract lines and compute the document's typography insights.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<AnalyzedDocument> {
        self.extract_lines(path).map(AnalyzedDocument::from_lines)
    }

    /// Like [`Sectionizer::analyze`], for an in-memory document.
    pub fn analyze_bytes(&self, bytes: &[u8], ext: &str) -> Result<AnalyzedDocument> {
        self.extract_lines_bytes(bytes, ext)
            .map(AnalyzedDocument::from_lines)
    }

    /// Label every line of an analyzed document.
    pub fn classify(&self, document: &AnalyzedDocument) -> Result<Vec<ClassifiedLine>> {
        let classifier = self.classifier.as_ref().ok_or(Error::MissingClassifier)?;
        Ok(classify_lines(
            classifier.as_ref(),
            &document.lines,
            &document.insights,
        ))
    }

    /// Assemble classified lines into chunked sections.
    pub fn assemble(&self, lines: &[ClassifiedLine]) -> Vec<ChunkedSection> {
        SectionAssembler::new(self.options.max_words).assemble(lines)
    }

    /// Run the full pipeline on a file.
    pub fn structure<P: AsRef<Path>>(&self, path: P) -> Result<Vec<ChunkedSection>> {
        // Fail before parsing when there is nothing to classify with.
        if self.classifier.is_none() {
            return Err(Error::MissingClassifier);
        }
        let document = self.analyze(path)?;
        self.structure_document(&document)
    }

    /// Run the full pipeline on an in-memory document.
    pub fn structure_bytes(&self, bytes: &[u8], ext: &str) -> Result<Vec<ChunkedSection>> {
        if self.classifier.is_none() {
            return Err(Error::MissingClassifier);
        }
        let document = self.analyze_bytes(bytes, ext)?;
        self.structure_document(&document)
    }

    /// Classify and assemble an already analyzed document.
    pub fn structure_document(&self, document: &AnalyzedDocument) -> Result<Vec<ChunkedSection>> {
        let classified = self.classify(document)?;
        Ok(self.assemble(&classified))
    }

    /// Rule-based labels for a file, keyed by line key.
    pub fn weak_labels<P: AsRef<Path>>(&self, path: P) -> Result<LabelSet> {
        Ok(self.analyze(path)?.weak_labels())
    }

    /// Structure many files. One failing file does not stop the others.
    ///
    /// Results come back in input order.
    pub fn structure_batch<P>(&self, paths: &[P]) -> Vec<BatchItem>
    where
        P: AsRef<Path> + Sync,
    {
        let run = |path: &P| BatchItem {
            path: path.as_ref().to_path_buf(),
            result: self.structure(path),
        };

        if self.options.parallel {
            paths.par_iter().map(run).collect()
        } else {
            paths.iter().map(run).collect()
        }
    }
}

impl Default for Sectionizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Sectionizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sectionizer")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("has_classifier", &self.has_classifier())
            .finish()
    }
}

fn repair(mut lines: Vec<Line>) -> Vec<Line> {
    RepairEngine::default().repair_lines(&mut lines);
    lines
}

/// Repaired lines of one document together with its typography insights.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedDocument {
    /// Lines in reading order
    pub lines: Vec<Line>,
    /// Body and heading typography
    pub insights: Insights,
}

impl AnalyzedDocument {
    /// Compute insights for already repaired lines.
    pub fn from_lines(lines: Vec<Line>) -> Self {
        let insights = Insights::from_lines(&lines);
        Self { lines, insights }
    }

    /// Feature vector of every line, in line order.
    pub fn features(&self) -> Vec<FeatureVector> {
        self.lines
            .iter()
            .map(|line| FeatureVector::from_line(line, &self.insights))
            .collect()
    }

    /// Rule-based labels for every line.
    pub fn weak_labels(&self) -> LabelSet {
        WeakLabeler::new().label_lines(&self.lines, &self.insights)
    }
}

/// Outcome of one file in a batch run.
#[derive(Debug)]
pub struct BatchItem {
    /// Input path
    pub path: PathBuf,
    /// Sections, or the error that stopped this file
    pub result: Result<Vec<ChunkedSection>>,
}

impl BatchItem {
    /// Whether this file was structured successfully.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(label: Label) -> impl Fn(&FeatureVector) -> Label + Send + Sync {
        move |_: &FeatureVector| label
    }

    #[test]
    fn test_sectionizer_builder() {
        let sectionizer = Sectionizer::new()
            .with_max_words(50)
            .with_line_threshold(3.5)
            .sequential();

        assert_eq!(sectionizer.options().max_words, 50);
        assert_eq!(sectionizer.options().line_threshold, 3.5);
        assert!(!sectionizer.options().parallel);
        assert!(!sectionizer.has_classifier());
    }

    #[test]
    fn test_structure_requires_classifier() {
        let result = Sectionizer::new().structure("missing.pdf");
        assert!(matches!(result, Err(Error::MissingClassifier)));
    }

    #[test]
    fn test_unsupported_extension() {
        let sectionizer = Sectionizer::new().with_classifier(always(Label::Paragraph));
        let result = sectionizer.structure("notes.txt");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let sectionizer = Sectionizer::new().with_max_words(0);
        let result = sectionizer.extract_lines_bytes(b"%PDF-1.5", "pdf");
        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn test_extract_bytes_wrong_magic() {
        let result = Sectionizer::new().extract_lines_bytes(b"<html></html>", "pdf");
        assert!(matches!(result, Err(Error::UnknownFormat("PDF"))));

        let result = Sectionizer::new().extract_lines_bytes(b"%PDF-1.5 not a zip", "docx");
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_without_classifier() {
        let document = AnalyzedDocument::from_lines(Vec::new());
        assert!(matches!(
            Sectionizer::new().classify(&document),
            Err(Error::MissingClassifier)
        ));
    }

    #[test]
    fn test_empty_document_structures_to_nothing() {
        let sectionizer = Sectionizer::new().with_classifier(always(Label::Heading));
        let document = AnalyzedDocument::from_lines(Vec::new());
        assert!(document.insights.paragraph_size.is_none());
        assert!(sectionizer.structure_document(&document).unwrap().is_empty());
    }

    #[test]
    fn test_batch_keeps_order_and_errors() {
        let sectionizer = Sectionizer::new().with_classifier(always(Label::Paragraph));
        let paths = ["a.txt", "missing.pdf", "b.odt"];

        for parallel in [true, false] {
            let s = sectionizer
                .clone()
                .with_options(PipelineOptions::new().with_parallel(parallel));
            let items = s.structure_batch(&paths);
            assert_eq!(items.len(), 3);
            assert_eq!(items[0].path, PathBuf::from("a.txt"));
            assert!(matches!(items[0].result, Err(Error::UnsupportedFormat(_))));
            assert!(matches!(items[1].result, Err(Error::Io(_))));
            assert!(!items[2].is_ok());
        }
    }
}
