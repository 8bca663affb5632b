use super::traits::TextExtractor;
use crate::errors::AnalyzerResult;
use crate::types::DocumentFormat;

/// One unit per line. Invalid UTF-8 is replaced rather than rejected.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        Ok(String::from_utf8_lossy(bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "PlainTextExtractor"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::PlainText
    }
}
