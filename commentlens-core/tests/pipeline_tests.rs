//! Pipeline tests: extraction → classification → tabulation → export.
//!
//! Classifiers are deterministic keyword stubs so nothing here touches the
//! network. Fixtures live in `test_fixtures/`; the PDF fixture is built in
//! memory with lopdf.

use commentlens_core::export::{
    report_lines, to_csv_bytes, to_pdf_bytes, to_xlsx_bytes, SHEET_NAME,
};
use commentlens_core::extractors::{SpreadsheetExtractor, TextExtractor};
use commentlens_core::*;
use std::path::{Path, PathBuf};

// ============================================================================
// Fixture helpers
// ============================================================================

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

fn report_font() -> PathBuf {
    fixtures_dir().join("DejaVuSans.ttf")
}

fn load_document(name: &str) -> RawDocument {
    RawDocument::from_path(&fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("Missing fixture {name}: {e}"))
}

/// NEGATIVE for texts mentioning "terrible" or "broke", POSITIVE otherwise
struct KeywordSentiment;

impl TextClassifier for KeywordSentiment {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Sentiment
    }

    fn name(&self) -> &str {
        "keyword-sentiment"
    }

    fn classify(&self, text: &str) -> AnalyzerResult<Prediction> {
        if text == "???" {
            return Err(AnalyzerError::classification(self.name(), "unparseable input"));
        }
        let lower = text.to_lowercase();
        if lower.contains("terrible") || lower.contains("broke") {
            Ok(Prediction::new("NEGATIVE", 0.97))
        } else {
            Ok(Prediction::new("POSITIVE", 0.88))
        }
    }
}

/// `toxic` for texts containing "idiot"
struct KeywordToxicity;

impl TextClassifier for KeywordToxicity {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Toxicity
    }

    fn name(&self) -> &str {
        "keyword-toxicity"
    }

    fn classify(&self, text: &str) -> AnalyzerResult<Prediction> {
        if text.to_lowercase().contains("idiot") {
            Ok(Prediction::new("toxic", 0.93))
        } else {
            Ok(Prediction::new("non-toxic", 0.99))
        }
    }
}

fn analyzer() -> DocumentAnalyzer {
    DocumentAnalyzer::new(ClassifierSet::new(vec![
        Box::new(KeywordSentiment),
        Box::new(KeywordToxicity),
    ]))
}

fn texts(rows: &[&ClassificationResult]) -> Vec<String> {
    rows.iter().map(|r| r.text.clone()).collect()
}

/// Minimal PDF with one text line per BT/ET block
fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12i64.into()]));
            operations.push(Operation::new(
                "Td",
                vec![72i64.into(), (720 - 20 * i as i64).into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
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

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

// ============================================================================
// Extraction
// ============================================================================

mod extraction {
    use super::*;

    #[test]
    fn csv_comments_deduplicated_and_empty_dropped() {
        let units = extract_text_units(&load_document("comments.csv")).unwrap();
        let texts: Vec<&str> = units.iter().map(TextUnit::as_str).collect();
        assert_eq!(texts, vec!["Great job!", "Terrible service"]);
    }

    #[test]
    fn csv_every_column_column_major() {
        let units = extract_text_units(&load_document("survey.csv")).unwrap();
        let texts: Vec<&str> = units.iter().map(TextUnit::as_str).collect();
        assert_eq!(
            texts,
            vec![
                "1",
                "2",
                "3",
                "4",
                "Love the new dashboard",
                "The export is terrible",
                "You idiots broke login again",
                "Please fix the export",
                "???",
            ]
        );
    }

    #[test]
    fn plain_text_lines() {
        let units = extract_text_units(&load_document("feedback.txt")).unwrap();
        let texts: Vec<&str> = units.iter().map(TextUnit::as_str).collect();
        assert_eq!(
            texts,
            vec![
                "Support answered within minutes",
                "Terrible service at the front desk"
            ]
        );
    }

    #[test]
    fn pdf_lines_in_page_then_line_order() {
        let pdf = build_pdf(&[
            &["Great job!", "Terrible service"],
            &["Great job!", "Needs work"],
        ]);
        let document = RawDocument::new("comments.pdf", DocumentFormat::Pdf, pdf);
        let units = extract_text_units(&document).unwrap();
        let texts: Vec<&str> = units.iter().map(TextUnit::as_str).collect();
        assert_eq!(texts, vec!["Great job!", "Terrible service", "Needs work"]);
    }

    #[test]
    fn unsupported_extension_reported_before_reading() {
        let err = RawDocument::from_path(Path::new("/nonexistent/notes.docx")).unwrap_err();
        assert!(matches!(err, AnalyzerError::UnsupportedFormat(_)));
        assert!(err.is_document_level());
    }

    #[test]
    fn xlsx_written_by_export_reads_back_column_major() {
        let table = analyzer().analyze_document(&load_document("comments.csv")).unwrap();
        let bytes = to_xlsx_bytes(&table).unwrap();

        let raw = SpreadsheetExtractor::new(DocumentFormat::Xlsx)
            .extract_raw(&bytes)
            .unwrap();
        // First column is the messages, in table order
        assert_eq!(&raw[..2], &["Great job!", "Terrible service"]);
        assert_eq!(&raw[2..4], &["POSITIVE", "NEGATIVE"]);
    }
}

// ============================================================================
// Classification
// ============================================================================

mod classification {
    use super::*;

    #[test]
    fn one_result_per_unit_in_extraction_order() {
        let document = load_document("survey.csv");
        let units = extract_text_units(&document).unwrap();
        let table = analyzer().analyze_document(&document).unwrap();

        assert_eq!(table.len(), units.len());
        let table_texts: Vec<&str> = table.rows().iter().map(|r| r.text.as_str()).collect();
        let unit_texts: Vec<&str> = units.iter().map(TextUnit::as_str).collect();
        assert_eq!(table_texts, unit_texts);
    }

    #[test]
    fn failing_unit_becomes_sentinel_and_batch_completes() {
        let table = analyzer().analyze_document(&load_document("survey.csv")).unwrap();
        let failed = table.failed();
        assert_eq!(texts(&failed), vec!["???"]);

        let csv = String::from_utf8(to_csv_bytes(&table).unwrap()).unwrap();
        assert!(csv.lines().any(|line| line == "???,ERROR,0,ERROR,0,,,ERROR"));
    }

    #[test]
    fn sentiment_percentages_sum_to_hundred() {
        let table = analyzer().analyze_document(&load_document("survey.csv")).unwrap();
        for row in table.rows().iter().filter(|r| !r.is_failed()) {
            let split = row.sentiment_split().expect("sentiment split");
            let total = split.positive_pct + split.negative_pct;
            assert!((total - 100.0).abs() < 0.011, "{}: {total}", row.text);
        }
    }

    #[test]
    fn capture_stages_exposes_each_boundary() {
        let stages = analyzer()
            .capture_stages(&load_document("comments.csv"))
            .unwrap();
        assert_eq!(stages.raw_texts.len(), 3);
        assert_eq!(stages.text_units.len(), 2);
        assert_eq!(stages.table.len(), 2);
    }
}

// ============================================================================
// Tabulation
// ============================================================================

mod tabulation {
    use super::*;

    fn survey_table() -> ResultTable {
        analyzer().analyze_document(&load_document("survey.csv")).unwrap()
    }

    #[test]
    fn positive_and_negative_are_disjoint_cover_of_classified_rows() {
        let table = survey_table();
        let positive = texts(&table.positive());
        let negative = texts(&table.negative());

        assert!(positive.iter().all(|t| !negative.contains(t)));
        assert_eq!(
            positive.len() + negative.len() + table.failed().len(),
            table.len()
        );
    }

    #[test]
    fn needs_attention_covers_negative_and_toxic() {
        let table = survey_table();
        let attention = texts(&table.needs_attention());
        for text in texts(&table.negative()) {
            assert!(attention.contains(&text));
        }
        for text in texts(&table.toxic()) {
            assert!(attention.contains(&text));
        }
        assert_eq!(
            attention,
            vec!["The export is terrible", "You idiots broke login again"]
        );
    }

    #[test]
    fn category_partition_covers_every_row_once() {
        let table = survey_table();
        let partitions = table.partition_by_category();
        let total: usize = partitions.iter().map(|(_, rows)| rows.len()).sum();
        assert_eq!(total, table.len());

        let names: Vec<&str> = partitions.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Positive", "Negative", "ERROR"]);
    }
}

// ============================================================================
// Export
// ============================================================================

mod exports {
    use super::*;

    #[test]
    fn csv_round_trip_preserves_rows_and_order() {
        let table = analyzer().analyze_document(&load_document("survey.csv")).unwrap();
        let bytes = to_csv_bytes(&table).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, table.headers());

        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        let expected: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|row| table.row_cells(row).iter().map(|c| c.to_string()).collect())
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn xlsx_has_single_sheet1() {
        use calamine::{open_workbook_auto_from_rs, Reader};

        let table = analyzer().analyze_document(&load_document("comments.csv")).unwrap();
        let bytes = to_xlsx_bytes(&table).unwrap();
        let workbook = open_workbook_auto_from_rs(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
    }

    #[test]
    fn missing_font_blocks_only_pdf() {
        let table = analyzer().analyze_document(&load_document("comments.csv")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let missing_font = dir.path().join("fonts/DejaVuSans.ttf");
        let target = ExportTarget {
            output_dir: dir.path(),
            file_name: "Full_Analysis",
            font_path: Some(missing_font.as_path()),
        };

        let report = export_all(&table, &ExportFormat::ALL, &target);

        assert!(!report.all_succeeded());
        assert!(dir.path().join("Full_Analysis.csv").is_file());
        assert!(dir.path().join("Full_Analysis.xlsx").is_file());
        assert!(!dir.path().join("Full_Analysis.pdf").exists());

        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, ExportFormat::Pdf);
        assert!(matches!(failures[0].1, AnalyzerError::ResourceMissing { .. }));
    }

    #[test]
    fn export_does_not_reorder_table() {
        let table = analyzer().analyze_document(&load_document("survey.csv")).unwrap();
        let before: Vec<String> = table.rows().iter().map(|r| r.text.clone()).collect();

        let _ = to_csv_bytes(&table).unwrap();
        let _ = to_xlsx_bytes(&table).unwrap();
        let lines = report_lines(&table);

        let after: Vec<String> = table.rows().iter().map(|r| r.text.clone()).collect();
        assert_eq!(before, after);
        for (line, text) in lines.iter().skip(1).zip(&before) {
            assert!(line.starts_with(text.as_str()));
        }
    }

    fn pdf_page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn pdf_report_fits_short_table_on_one_page() {
        let table = analyzer().analyze_document(&load_document("comments.csv")).unwrap();
        let bytes = to_pdf_bytes(&table, "Full_Analysis", &report_font()).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(pdf_page_count(&bytes), 1);
    }

    #[test]
    fn pdf_report_wraps_and_paginates_long_tables() {
        let units: Vec<TextUnit> = (0..200)
            .map(|i| {
                TextUnit::new(&format!(
                    "Commentaire n°{i}: le délai de réponse était très long, \
                     service client à revoir — Kundendienst überfordert, Ärger über Verzögerungen"
                ))
                .unwrap()
            })
            .collect();
        let table = analyzer().classify_units(&units);
        assert_eq!(table.len(), 200);

        // Every row is longer than one report line
        let lines = report_lines(&table);
        assert!(lines.iter().skip(1).all(|line| line.chars().count() > 95));

        let bytes = to_pdf_bytes(&table, "Full_Analysis", &report_font()).unwrap();
        assert!(pdf_page_count(&bytes) > 1);
    }

    #[test]
    fn export_all_writes_every_format_with_font() {
        let table = analyzer().analyze_document(&load_document("survey.csv")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let font = report_font();
        let target = ExportTarget {
            output_dir: dir.path(),
            file_name: "Survey",
            font_path: Some(font.as_path()),
        };

        let report = export_all(&table, &ExportFormat::ALL, &target);

        assert!(report.all_succeeded(), "{:?}", report.failures());
        assert_eq!(report.written().len(), 3);
        let pdf = std::fs::read(dir.path().join("Survey.pdf")).unwrap();
        assert_eq!(pdf_page_count(&pdf), 1);
    }
}
