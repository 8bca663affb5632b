// Extractor abstraction for document ingestion
//
// This module defines the boundary between reading a document (bytes in some
// container format) and everything downstream, which only ever sees cleaned
// TextUnits.

use crate::errors::AnalyzerResult;
use crate::types::{DocumentFormat, TextUnit};
use std::collections::HashSet;

/// Extractor trait - converts document bytes to TextUnits
///
/// Extractors handle:
/// - Container format parsing (CSV, workbook, PDF, plain text)
/// - Flattening the document into an ordered list of raw strings
///
/// Cleaning (trim, drop empty, drop duplicates) is shared and happens in
/// [`TextExtractor::extract`], so every format obeys the same rules.
pub trait TextExtractor {
    /// Raw strings in document order, before cleaning
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>>;

    /// Main entry point: raw extraction followed by cleaning
    fn extract(&self, bytes: &[u8]) -> AnalyzerResult<Vec<TextUnit>> {
        Ok(clean_units(self.extract_raw(bytes)?))
    }

    /// Extractor name for logging
    fn name(&self) -> &str;

    fn supports_format(&self, format: DocumentFormat) -> bool;
}

/// Trim, drop empties and drop later duplicates, keeping first-occurrence order.
pub fn clean_units<I, S>(raw: I) -> Vec<TextUnit>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|s| TextUnit::new(s.as_ref()))
        .filter(|unit| seen.insert(unit.clone()))
        .collect()
}
