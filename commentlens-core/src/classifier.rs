use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::types::*;
use image::DynamicImage;

/// A pretrained text model behind a single `text -> (label, confidence)` call.
///
/// Implementations are constructed once and shared read-only; `classify`
/// takes `&self` and must not keep per-call state.
pub trait TextClassifier {
    fn kind(&self) -> ClassifierKind;

    /// Model identifier for logging
    fn name(&self) -> &str;

    fn classify(&self, text: &str) -> AnalyzerResult<Prediction>;
}

/// A pretrained image model returning its `top_k` labels.
pub trait ImageClassifier {
    fn name(&self) -> &str;

    fn classify_image(&self, image: &DynamicImage, top_k: usize) -> AnalyzerResult<Vec<Prediction>>;
}

/// The classifiers selected for one run, in column order.
pub struct ClassifierSet {
    classifiers: Vec<Box<dyn TextClassifier>>,
}

impl ClassifierSet {
    pub fn new(classifiers: Vec<Box<dyn TextClassifier>>) -> Self {
        Self { classifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn kinds(&self) -> Vec<ClassifierKind> {
        self.classifiers.iter().map(|c| c.kind()).collect()
    }

    pub fn first(&self) -> Option<&dyn TextClassifier> {
        self.classifiers.first().map(|c| c.as_ref())
    }

    /// Run every classifier once over `unit`.
    ///
    /// All-or-nothing: if any call fails, the whole unit becomes a failed
    /// result and no partial dimensions are kept.
    pub fn classify_unit(&self, unit: &TextUnit) -> ClassificationResult {
        match self.try_classify_unit(unit) {
            Ok(dimensions) => ClassificationResult::classified(unit.as_str(), dimensions),
            Err(e) => {
                tracing::warn!("⚠️  Classification failed for {:?}: {e}", unit.as_str());
                ClassificationResult::failed(unit.as_str(), e.to_string())
            }
        }
    }

    fn try_classify_unit(&self, unit: &TextUnit) -> AnalyzerResult<Vec<DimensionResult>> {
        self.classifiers
            .iter()
            .map(|classifier| {
                let prediction = classifier.classify(unit.as_str())?;
                tracing::debug!(
                    "🔍 {} → {} ({:.4})",
                    classifier.name(),
                    prediction.label,
                    prediction.score
                );
                Ok(DimensionResult {
                    kind: classifier.kind(),
                    prediction,
                })
            })
            .collect()
    }
}

/// Decode image bytes and return the model's top-k labels, best first.
pub fn classify_image_bytes(
    classifier: &dyn ImageClassifier,
    bytes: &[u8],
    top_k: usize,
) -> AnalyzerResult<Vec<Prediction>> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AnalyzerError::extraction(DocumentFormat::Image, e))?;

    tracing::info!(
        "🖼️  Classifying {}x{} image with {}",
        image.width(),
        image.height(),
        classifier.name()
    );
    let mut predictions = classifier.classify_image(&image, top_k)?;
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    predictions.truncate(top_k);
    Ok(predictions)
}
