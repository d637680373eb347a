//! Integration tests for line sources and the `Sectionizer` entry point.

use std::io::Write;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use sectionize::error::Result;
use sectionize::model::{Label, Line};
use sectionize::parser::LineAggregator;
use sectionize::source::{DocxSource, LineSource, PdfSource, SourceRegistry};
use sectionize::{Error, FeatureVector, LabelStore, Sectionizer, SizeKey};

fn heading_by_size(features: &FeatureVector) -> Label {
    if features.by_name("is_heading_size") == Some(1.0) {
        Label::Heading
    } else {
        Label::Paragraph
    }
}

/// One shown string: font resource, size, x, baseline y, text.
type Run<'a> = (&'a str, f32, f32, f32, &'a str);

/// Builds an A4 PDF with one content stream per page.
fn build_pdf(pages: &[&[Run]], compress: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let heading_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => heading_font,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for runs in pages {
        let mut operations = Vec::new();
        for &(font, size, x, y, text) in runs.iter() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if compress {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// One uncompressed page with a 16pt heading and two 12pt body lines.
fn create_test_pdf() -> Vec<u8> {
    build_pdf(
        &[&[
            ("F2", 16.0, 72.0, 700.0, "Introduction"),
            ("F1", 12.0, 72.0, 680.0, "Machine learning is used today."),
            ("F1", 12.0, 72.0, 666.0, "It works well in practice."),
        ]],
        false,
    )
}

fn line_texts(lines: &[Line]) -> Vec<&str> {
    lines.iter().map(|l| l.text.as_str()).collect()
}

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial"/><w:sz w:val="32"/></w:rPr><w:t>Introduction</w:t></w:r></w:p>
<w:p>
<w:r><w:rPr><w:rFonts w:ascii="Calibri"/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">Machine learning </w:t></w:r>
<w:r><w:rPr><w:rFonts w:ascii="Calibri"/><w:sz w:val="24"/></w:rPr><w:t>is used today.</w:t></w:r>
</w:p>
<w:p/>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell text</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Calibri"/><w:sz w:val="24"/></w:rPr><w:t>It works well in practice.</w:t></w:r></w:p>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial"/><w:sz w:val="32"/></w:rPr><w:t>Results</w:t></w:r></w:p>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Calibri"/><w:sz w:val="24"/></w:rPr><w:t>The results show that the model works.</w:t></w:r></w:p>
<w:sectPr/>
</w:body>
</w:document>"#;

fn create_test_docx(document_xml: &str) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// Source that ignores its input and returns fixed lines.
struct FixedSource;

impl LineSource for FixedSource {
    fn supported_extensions(&self) -> &[&str] {
        &["txt", "text"]
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn extract_bytes(&self, _bytes: &[u8], _aggregator: &LineAggregator) -> Result<Vec<Line>> {
        let size = |points: f32| {
            let mut stats: indexmap::IndexMap<SizeKey, u32> = indexmap::IndexMap::new();
            stats.insert(SizeKey::from_points(points), 1);
            stats
        };
        Ok(vec![
            Line::new("Summary", 0, 0, 10.0, size(18.0), Default::default()),
            Line::new("Short body text.", 1, 0, 30.0, size(12.0), Default::default()),
            Line::new("More body text.", 2, 0, 45.0, size(12.0), Default::default()),
        ])
    }
}

// ==================== PDF ====================

#[test]
fn test_pdf_words_in_reading_order() {
    let pages = PdfSource::new().words_from_bytes(&create_test_pdf()).unwrap();

    assert_eq!(pages.len(), 1);
    let words = &pages[0];
    assert_eq!(words.len(), 11);
    assert_eq!(words[0].text, "Introduction");
    assert_eq!(words[0].font_name, "Helvetica-Bold");
    assert_eq!(words[0].font_size, 16.0);
    // MediaBox top 842, baseline 700, ascent 0.8 * 16
    assert!((words[0].top - 129.2).abs() < 0.01);
    assert_eq!(words[1].text, "Machine");
    assert_eq!(words[1].font_name, "Helvetica");
    assert_eq!(words[10].text, "practice.");
}

#[test]
fn test_pdf_lines() {
    let lines = PdfSource::new()
        .extract_bytes(&create_test_pdf(), &LineAggregator::default())
        .unwrap();

    assert_eq!(
        line_texts(&lines),
        vec![
            "Introduction",
            "Machine learning is used today.",
            "It works well in practice."
        ]
    );
    // Duplicate sizes within a PDF line count once.
    assert_eq!(lines[1].size_stats.values().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(lines[1].style_stats.get("Helvetica"), Some(&1));
}

#[test]
fn test_pdf_structure() {
    let sectionizer = Sectionizer::new().with_classifier(heading_by_size);
    let sections = sectionizer.structure_bytes(&create_test_pdf(), "pdf").unwrap();

    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].heading, "Introduction");
    assert_eq!(
        sections[0].chunks[0].content,
        "Machine learning is used today. It works well in practice."
    );
}

#[test]
fn test_pdf_mixed_sizes_on_one_baseline() {
    let bytes = build_pdf(
        &[&[
            ("F1", 12.0, 72.0, 700.0, "Mixed"),
            ("F1", 13.0, 110.0, 700.0, "sizes"),
            ("F1", 12.0, 72.0, 680.0, "Plain body text here."),
        ]],
        false,
    );
    let lines = PdfSource::new()
        .extract_bytes(&bytes, &LineAggregator::default())
        .unwrap();

    assert_eq!(line_texts(&lines), vec!["Mixed sizes", "Plain body text here."]);
    let sizes: Vec<SizeKey> = lines[0].size_stats.keys().copied().collect();
    assert_eq!(sizes.len(), 2);
    assert!(sizes.contains(&SizeKey::from_points(12.0)));
    assert!(sizes.contains(&SizeKey::from_points(13.0)));
}

#[test]
fn test_pdf_jittered_baseline() {
    let bytes = build_pdf(
        &[&[
            ("F1", 12.0, 72.0, 700.0, "Hello"),
            ("F1", 12.0, 120.0, 700.2, "world"),
        ]],
        true,
    );
    let lines = PdfSource::new()
        .extract_bytes(&bytes, &LineAggregator::default())
        .unwrap();

    assert_eq!(line_texts(&lines), vec!["Hello world"]);
}

#[test]
fn test_pdf_line_indices_across_pages() {
    let bytes = build_pdf(
        &[
            &[
                ("F2", 16.0, 72.0, 700.0, "Introduction"),
                ("F1", 12.0, 72.0, 680.0, "Machine learning is used today."),
            ],
            &[
                ("F1", 12.0, 72.0, 760.0, "It works well in practice."),
                ("F2", 16.0, 72.0, 730.0, "Results"),
                ("F1", 12.0, 72.0, 710.0, "The model works."),
            ],
        ],
        true,
    );
    let lines = PdfSource::new()
        .extract_bytes(&bytes, &LineAggregator::default())
        .unwrap();

    assert_eq!(
        line_texts(&lines),
        vec![
            "Introduction",
            "Machine learning is used today.",
            "It works well in practice.",
            "Results",
            "The model works."
        ]
    );
    let indices: Vec<usize> = lines.iter().map(|l| l.line_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    let pages: Vec<usize> = lines.iter().map(|l| l.page_index).collect();
    assert_eq!(pages, vec![0, 0, 1, 1, 1]);

    let sections = Sectionizer::new()
        .with_classifier(heading_by_size)
        .structure_bytes(&bytes, "pdf")
        .unwrap();
    let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, vec!["Introduction", "Results"]);
}

// ==================== DOCX ====================

#[test]
fn test_docx_body_paragraphs_only() {
    let lines = DocxSource::new()
        .extract_bytes(&create_test_docx(DOCUMENT_XML), &LineAggregator::default())
        .unwrap();

    assert_eq!(
        line_texts(&lines),
        vec![
            "Introduction",
            "Machine learning is used today.",
            "It works well in practice.",
            "Results",
            "The results show that the model works."
        ]
    );

    // Ordinals count the empty paragraph but not the table cell.
    let tops: Vec<f32> = lines.iter().map(|l| l.layout.top).collect();
    assert_eq!(tops, vec![0.0, 1.0, 3.0, 4.0, 5.0]);

    // Every run counts.
    assert_eq!(lines[1].style_stats.get("Calibri"), Some(&2));
    assert_eq!(lines[1].size_stats.values().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_docx_missing_document_part() {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        zip.finish().unwrap();
    }

    let err = DocxSource::new()
        .extract_bytes(&cursor.into_inner(), &LineAggregator::default())
        .unwrap_err();
    assert!(matches!(err, Error::DocxParse(_)));
}

#[test]
fn test_docx_structure_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.docx");
    std::fs::write(&path, create_test_docx(DOCUMENT_XML)).unwrap();

    let sectionizer = Sectionizer::new().with_classifier(heading_by_size);
    let sections = sectionizer.structure(&path).unwrap();

    let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
    assert_eq!(headings, vec!["Introduction", "Results"]);
    assert_eq!(
        sections[1].chunks[0].content,
        "The results show that the model works."
    );

    let document = sectionizer.analyze(&path).unwrap();
    assert_eq!(document.insights.paragraph_font.as_deref(), Some("Calibri"));
    assert_eq!(document.insights.heading_size.map(|s| s.points()), Some(16.0));
}

#[test]
fn test_weak_labels_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.docx");
    std::fs::write(&path, create_test_docx(DOCUMENT_XML)).unwrap();

    let labels = Sectionizer::new().weak_labels(&path).unwrap();
    assert_eq!(labels.get("0_0"), Some(Label::Heading));
    assert_eq!(labels.get("0_1"), Some(Label::Paragraph));
    assert_eq!(labels.get("0_3"), Some(Label::Heading));

    let mut store = LabelStore::new();
    store.insert("report.docx", labels.clone());
    let store_path = dir.path().join("labels.json");
    store.save(&store_path).unwrap();

    let loaded = LabelStore::load(&store_path).unwrap();
    assert_eq!(loaded.for_path(&path), Some(&labels));
}

#[test]
fn test_batch_with_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.docx");
    let bad = dir.path().join("bad.docx");
    std::fs::write(&good, create_test_docx(DOCUMENT_XML)).unwrap();
    std::fs::write(&bad, b"not a zip archive").unwrap();

    let sectionizer = Sectionizer::new().with_classifier(heading_by_size);
    let items = sectionizer.structure_batch(&[good.clone(), bad.clone()]);

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].path, good);
    assert_eq!(items[0].result.as_ref().unwrap().len(), 2);
    assert!(matches!(items[1].result, Err(Error::UnknownFormat("DOCX"))));
}

// ==================== Registry ====================

#[test]
fn test_custom_source_registration() {
    let mut registry = SourceRegistry::with_defaults();
    registry.register(Arc::new(FixedSource));

    assert!(registry.supports("TXT"));
    assert_eq!(registry.supported_extensions(), vec!["docx", "pdf", "text", "txt"]);
    assert_eq!(registry.get_by_extension("text").unwrap().name(), "fixed");

    let sectionizer = Sectionizer::new()
        .with_registry(registry)
        .with_classifier(heading_by_size);
    let sections = sectionizer.structure_bytes(b"ignored", "txt").unwrap();

    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].heading, "Summary");
    assert_eq!(
        sections[0].chunks[0].content,
        "Short body text. More body text."
    );
}
