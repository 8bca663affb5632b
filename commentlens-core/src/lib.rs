// Commentlens Core Library
//
// Extracts comments from uploaded documents, classifies them with injected
// pretrained models and exports the resulting table.

pub mod types;
pub mod errors;
pub mod extractors;
pub mod classifier;
pub mod backends;
pub mod processor;
pub mod table;
pub mod export;
pub mod config;
pub mod console;

// Re-export main types and functions for easy use
pub use types::*;
pub use errors::{AnalyzerError, AnalyzerResult, UnsupportedFormatKind};
pub use extractors::{extract_text_units, Extractor, TextExtractor};
pub use classifier::{classify_image_bytes, ClassifierSet, ImageClassifier, TextClassifier};
pub use processor::{DocumentAnalyzer, PipelineStages, StepProfiler};
pub use table::ResultTable;
pub use export::{export_all, ExportFormat, ExportReport, ExportTarget};
pub use config::AnalyzerConfig;

// Re-export backends for direct use
#[cfg(feature = "hosted-inference")]
pub use backends::{HostedImageClassifier, HostedTextClassifier, InferenceClient};
