//! PDF extractor
//!
//! Pulls the text layer of every page through lopdf and splits it into lines,
//! page order first, then line order.

use super::traits::TextExtractor;
use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::types::DocumentFormat;
use lopdf::Document;

pub struct PdfExtractor;

impl PdfExtractor {
    /// Text of each page, in page order. Pages whose text layer cannot be
    /// decoded come back empty.
    pub fn page_texts(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        let document = Document::load_mem(bytes)
            .map_err(|e| AnalyzerError::extraction(DocumentFormat::Pdf, e))?;

        // get_pages is a BTreeMap keyed by 1-based page number
        let pages = document.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::warn!("⚠️  No text layer on page {page_number}: {e}");
                    texts.push(String::new());
                }
            }
        }
        Ok(texts)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract_raw(&self, bytes: &[u8]) -> AnalyzerResult<Vec<String>> {
        let pages = self.page_texts(bytes)?;
        tracing::debug!("📄 Extracted text from {} PDF pages", pages.len());
        Ok(pages
            .iter()
            .flat_map(|page| page.lines())
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &str {
        "PdfExtractor"
    }

    fn supports_format(&self, format: DocumentFormat) -> bool {
        format == DocumentFormat::Pdf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_fails() {
        let err = PdfExtractor.extract(b"This is not a PDF").unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Extraction {
                format: DocumentFormat::Pdf,
                ..
            }
        ));
    }
}
