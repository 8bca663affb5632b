//! Tabular extractors (CSV and Excel workbooks)
//!
//! Both treat the first row as a header and flatten the remaining cells
//! column-major: every cell of the first column top to bottom, then the
//! second column, and so on. Empty cells and the usual spreadsheet NA markers
//! (`NA`, `N/A`, `null`, `NaN`, ...) are nulls and never become units.

use super::traits::TextExtractor;
use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::types::DocumentFormat;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Cell values read as missing data, matched exactly after trimming
pub const NA_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True for blank cells and NA markers
pub fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || NA_MARKERS.contains(&value)
}

pub struct CsvExtractor;

impl TextExtractor for CsvExtractor {
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let header_count = reader
            .headers()
            .map_err(|e| AnalyzerError::extraction(DocumentFormat::Csv, e))?
            .len();

        let mut columns: Vec<Vec<String>> = vec![Vec::new(); header_count];
        for record in reader.records() {
            let record = record.map_err(|e| AnalyzerError::extraction(DocumentFormat::Csv, e))?;
            // Ragged rows may be wider than the header
            if record.len() > columns.len() {
                columns.resize_with(record.len(), Vec::new);
            }
            for (index, field) in record.iter().enumerate() {
                if !is_missing(field) {
                    columns[index].push(field.to_string());
                }
            }
        }

        Ok(columns.into_iter().flatten().collect())
    }

    fn name(&self) -> &str {
        "CsvExtractor"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Csv
    }
}

/// Reads the first worksheet of an xlsx/xls workbook
pub struct SpreadsheetExtractor {
    format: DocumentFormat,
}

impl SpreadsheetExtractor {
    pub fn new(format: DocumentFormat) -> Self {
        Self { format }
    }
}

impl TextExtractor for SpreadsheetExtractor {
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| AnalyzerError::extraction(self.format, e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AnalyzerError::extraction(self.format, "workbook has no worksheets"))?
            .map_err(|e| AnalyzerError::extraction(self.format, e))?;

        let (height, width) = range.get_size();
        let mut texts = Vec::new();
        for column in 0..width {
            // Row 0 is the header
            for row in 1..height {
                if let Some(text) = range.get((row, column)).and_then(cell_text) {
                    texts.push(text);
                }
            }
        }
        Ok(texts)
    }

    fn name(&self) -> &str {
        "SpreadsheetExtractor"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        matches!(format, DocumentFormat::Xlsx | DocumentFormat::Xls)
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Float(f) if f.is_nan() => None,
        Data::String(s) if is_missing(s) => None,
        Data::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
