use crate::types::DocumentFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Why a document could not be routed to an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedFormatKind {
    /// Extension is not one of the known document or image types
    #[error("unknown extension '.{0}'")]
    UnknownExtension(String),
    /// Path has no extension at all
    #[error("file has no extension")]
    MissingExtension,
    /// Format is known but carries no text (e.g. images sent to text extraction)
    #[error("{0} documents carry no extractable text")]
    NotATextSource(DocumentFormat),
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(UnsupportedFormatKind),

    #[error("failed to extract {format} document: {reason}")]
    Extraction {
        format: DocumentFormat,
        reason: String,
    },

    #[error("classifier '{classifier}' failed: {reason}")]
    ClassificationFailure { classifier: String, reason: String },

    #[error("required resource '{resource}' not found at {}", path.display())]
    ResourceMissing { resource: String, path: PathBuf },

    #[error("{format} export failed: {reason}")]
    Export { format: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn extraction(format: DocumentFormat, reason: impl std::fmt::Display) -> Self {
        AnalyzerError::Extraction {
            format,
            reason: reason.to_string(),
        }
    }

    pub fn classification(classifier: &str, reason: impl std::fmt::Display) -> Self {
        AnalyzerError::ClassificationFailure {
            classifier: classifier.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn export(format: &str, reason: impl std::fmt::Display) -> Self {
        AnalyzerError::Export {
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that end processing of the current document only
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            AnalyzerError::UnsupportedFormat(_) | AnalyzerError::Extraction { .. }
        )
    }
}

pub type AnalyzerResult<T> = std::result::Result<T, AnalyzerError>;
