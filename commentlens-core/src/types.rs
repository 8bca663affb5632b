use crate::errors::{AnalyzerError, AnalyzerResult, UnsupportedFormatKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Label written into every dimension of a unit whose classification failed.
pub const ERROR_LABEL: &str = "ERROR";

// ===== DOCUMENT TYPES =====

/// Closed set of input formats. Dispatch happens on this tag, never on raw
/// extension strings past [`DocumentFormat::from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Csv,
    Xlsx,
    Xls,
    Pdf,
    Image,
    PlainText,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> AnalyzerResult<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(DocumentFormat::Csv),
            "xlsx" => Ok(DocumentFormat::Xlsx),
            "xls" => Ok(DocumentFormat::Xls),
            "pdf" => Ok(DocumentFormat::Pdf),
            "txt" | "text" => Ok(DocumentFormat::PlainText),
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp" => Ok(DocumentFormat::Image),
            other => Err(AnalyzerError::UnsupportedFormat(
                UnsupportedFormatKind::UnknownExtension(other.to_string()),
            )),
        }
    }

    pub fn from_path(path: &Path) -> AnalyzerResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(AnalyzerError::UnsupportedFormat(
                UnsupportedFormatKind::MissingExtension,
            ))?;
        Self::from_extension(extension)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Csv => "CSV",
            DocumentFormat::Xlsx => "XLSX",
            DocumentFormat::Xls => "XLS",
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Image => "image",
            DocumentFormat::PlainText => "plain text",
        };
        f.write_str(name)
    }
}

/// An uploaded document: consumed once by extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }

    /// Read a document from disk, detecting its format by extension.
    /// The format is checked before the file is read.
    pub fn from_path(path: &Path) -> AnalyzerResult<Self> {
        let format = DocumentFormat::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, format, bytes))
    }
}

/// A trimmed, non-empty piece of text to classify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextUnit(String);

impl TextUnit {
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TextUnit {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ===== CLASSIFICATION TYPES =====

/// Classifier capabilities a text can be run through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    Sentiment,
    Toxicity,
    Emotion,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 3] = [
        ClassifierKind::Sentiment,
        ClassifierKind::Toxicity,
        ClassifierKind::Emotion,
    ];

    /// Column header used in tables and exports
    pub fn display_name(&self) -> &'static str {
        match self {
            ClassifierKind::Sentiment => "Sentiment",
            ClassifierKind::Toxicity => "Toxicity",
            ClassifierKind::Emotion => "Emotion",
        }
    }

    /// `(positive, negative)` labels for kinds with a closed two-class vocabulary.
    /// Toxicity models are multi-label and emotion models multi-class, so only
    /// sentiment qualifies.
    pub fn binary_labels(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ClassifierKind::Sentiment => Some(("POSITIVE", "NEGATIVE")),
            ClassifierKind::Toxicity | ClassifierKind::Emotion => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sentiment" => Some(ClassifierKind::Sentiment),
            "toxicity" | "toxic" => Some(ClassifierKind::Toxicity),
            "emotion" => Some(ClassifierKind::Emotion),
            _ => None,
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single `(label, confidence)` answer from a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    /// Scores outside `[0, 1]` (or NaN) are clamped into range.
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            label: label.into(),
            score,
        }
    }

    pub fn sentinel() -> Self {
        Self {
            label: ERROR_LABEL.to_string(),
            score: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.label == ERROR_LABEL
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label.eq_ignore_ascii_case(label)
    }
}

/// Percentages for both classes of a binary prediction.
///
/// The model only reports the confidence `c` of the label it picked; the other
/// class is *assumed* to have `1 - c`. That holds for a closed two-class
/// softmax and nothing else, so a split is only ever derived for kinds where
/// [`ClassifierKind::binary_labels`] is `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinarySplit {
    pub positive_pct: f64,
    pub negative_pct: f64,
}

impl BinarySplit {
    pub fn from_prediction(kind: ClassifierKind, prediction: &Prediction) -> Option<Self> {
        let (positive, negative) = kind.binary_labels()?;
        let positive_score = if prediction.has_label(positive) {
            prediction.score
        } else if prediction.has_label(negative) {
            1.0 - prediction.score
        } else {
            return None;
        };

        Some(Self {
            positive_pct: round_pct(positive_score),
            negative_pct: round_pct(1.0 - positive_score),
        })
    }
}

/// `score * 100` rounded to two decimal places
pub fn round_pct(score: f64) -> f64 {
    (score * 10_000.0).round() / 100.0
}

/// One classifier's answer for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub kind: ClassifierKind,
    pub prediction: Prediction,
}

impl DimensionResult {
    pub fn binary_split(&self) -> Option<BinarySplit> {
        BinarySplit::from_prediction(self.kind, &self.prediction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// One entry per requested kind, in request order
    Classified { dimensions: Vec<DimensionResult> },
    /// Some classifier call errored; every dimension reports the sentinel
    Failed { reason: String },
}

/// The combined result of running every requested classifier over one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub text: String,
    pub outcome: ClassificationOutcome,
}

impl ClassificationResult {
    pub fn classified(text: impl Into<String>, dimensions: Vec<DimensionResult>) -> Self {
        Self {
            text: text.into(),
            outcome: ClassificationOutcome::Classified { dimensions },
        }
    }

    pub fn failed(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: ClassificationOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ClassificationOutcome::Failed { .. })
    }

    /// Prediction for `kind`. Failed results yield the sentinel for any kind.
    /// Classified results yield `None` for kinds that were not requested.
    pub fn prediction(&self, kind: ClassifierKind) -> Option<Prediction> {
        match &self.outcome {
            ClassificationOutcome::Classified { dimensions } => dimensions
                .iter()
                .find(|d| d.kind == kind)
                .map(|d| d.prediction.clone()),
            ClassificationOutcome::Failed { .. } => Some(Prediction::sentinel()),
        }
    }

    /// Sentiment split, absent for failed rows and tables without sentiment
    pub fn sentiment_split(&self) -> Option<BinarySplit> {
        match &self.outcome {
            ClassificationOutcome::Classified { dimensions } => dimensions
                .iter()
                .find(|d| d.kind == ClassifierKind::Sentiment)
                .and_then(DimensionResult::binary_split),
            ClassificationOutcome::Failed { .. } => None,
        }
    }
}
