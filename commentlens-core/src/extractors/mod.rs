//! Document Extractors
//!
//! This module turns uploaded documents into the ordered, cleaned list of
//! TextUnits that feeds classification.
//!
//! ## Architecture
//!
//! ```text
//! RawDocument (CSV, XLSX, XLS, PDF, TXT)
//!     ↓
//! [Format-specific Extractor]   (one variant per DocumentFormat)
//!     ↓
//! raw strings (document order)
//!     ↓
//! [clean_units]  trim → drop empty → drop duplicates
//!     ↓
//! Vec<TextUnit>
//! ```
//!
//! Images have no text layer; asking for their text is an
//! `UnsupportedFormatKind::NotATextSource` error.

pub mod pdf;
pub mod plain_text;
pub mod tabular;
pub mod traits;

pub use pdf::PdfExtractor;
pub use plain_text::PlainTextExtractor;
pub use tabular::{CsvExtractor, SpreadsheetExtractor};
pub use traits::{clean_units, TextExtractor};

use crate::errors::{AnalyzerError, AnalyzerResult, UnsupportedFormatKind};
use crate::types::{DocumentFormat, RawDocument, TextUnit};

/// Extractor enum, one handler per text-bearing format
pub enum Extractor {
    Csv(CsvExtractor),
    Spreadsheet(SpreadsheetExtractor),
    Pdf(PdfExtractor),
    PlainText(PlainTextExtractor),
}

impl Extractor {
    pub fn for_format(format: DocumentFormat) -> AnalyzerResult<Self> {
        match format {
            DocumentFormat::Csv => Ok(Extractor::Csv(CsvExtractor)),
            DocumentFormat::Xlsx | DocumentFormat::Xls => {
                Ok(Extractor::Spreadsheet(SpreadsheetExtractor::new(format)))
            }
            DocumentFormat::Pdf => Ok(Extractor::Pdf(PdfExtractor)),
            DocumentFormat::PlainText => Ok(Extractor::PlainText(PlainTextExtractor)),
            DocumentFormat::Image => Err(AnalyzerError::UnsupportedFormat(
                UnsupportedFormatKind::NotATextSource(format),
            )),
        }
    }
}

impl TextExtractor for Extractor {
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        match self {
            Extractor::Csv(extractor) => extractor.extract_raw(bytes),
            Extractor::Spreadsheet(extractor) => extractor.extract_raw(bytes),
            Extractor::Pdf(extractor) => extractor.extract_raw(bytes),
            Extractor::PlainText(extractor) => extractor.extract_raw(bytes),
        }
    }

    fn name(&self) -> &str {
        match self {
            Extractor::Csv(extractor) => extractor.name(),
            Extractor::Spreadsheet(extractor) => extractor.name(),
            Extractor::Pdf(extractor) => extractor.name(),
            Extractor::PlainText(extractor) => extractor.name(),
        }
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        match self {
            Extractor::Csv(extractor) => extractor.supports_format(format),
            Extractor::Spreadsheet(extractor) => extractor.supports_format(format),
            Extractor::Pdf(extractor) => extractor.supports_format(format),
            Extractor::PlainText(extractor) => extractor.supports_format(format),
        }
    }
}

/// Extract the deduplicated, order-preserving TextUnits of a document.
pub fn extract_text_units(document: &RawDocument) -> AnalyzerResult<Vec<TextUnit>> {
    let extractor = Extractor::for_format(document.format)?;
    let units = extractor.extract(&document.bytes)?;
    tracing::info!(
        "📄 {} extracted {} text units from {}",
        extractor.name(),
        units.len(),
        document.name
    );
    Ok(units)
}
