use crate::classifier::ClassifierSet;
use crate::errors::AnalyzerResult;
use crate::extractors::{Extractor, TextExtractor};
use crate::table::ResultTable;
use crate::types::*;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics; lets you inspect each boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub document_name: String,
    pub format: DocumentFormat,
    pub raw_texts: Vec<String>,
    pub text_units: Vec<TextUnit>,
    pub table: ResultTable,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        tracing::info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Extraction → classification → tabulation for one document at a time.
///
/// Holds no state between documents; the classifier set is owned and only
/// ever borrowed immutably.
pub struct DocumentAnalyzer {
    classifiers: ClassifierSet,
}

impl DocumentAnalyzer {
    pub fn new(classifiers: ClassifierSet) -> Self {
        Self { classifiers }
    }

    /// Convenience constructor: hosted classifiers for every enabled entry
    #[cfg(feature = "hosted-inference")]
    pub fn from_config(config: &crate::config::AnalyzerConfig) -> Self {
        let classifiers = crate::backends::HostedTextClassifier::from_config(config);
        Self::new(ClassifierSet::new(classifiers))
    }

    pub fn classifiers(&self) -> &ClassifierSet {
        &self.classifiers
    }

    /// Classify units sequentially; output order is input order and every
    /// unit yields exactly one row.
    pub fn classify_units(&self, units: &[TextUnit]) -> ResultTable {
        let mut table = ResultTable::new(self.classifiers.kinds());
        for (index, unit) in units.iter().enumerate() {
            tracing::debug!("🔍 [{}/{}] {}", index + 1, units.len(), unit);
            table.push(self.classifiers.classify_unit(unit));
        }

        let failed = table.failed().len();
        if failed > 0 {
            tracing::warn!("⚠️  {failed} of {} units could not be classified", table.len());
        }
        table
    }

    /// Main entry point: document in, result table out
    pub fn analyze_document(&self, document: &RawDocument) -> AnalyzerResult<ResultTable> {
        self.analyze_document_with_profiler(document, &mut StepProfiler::new(false))
    }

    pub fn analyze_document_with_profiler(
        &self,
        document: &RawDocument,
        profiler: &mut StepProfiler,
    ) -> AnalyzerResult<ResultTable> {
        let start_time = Instant::now();
        tracing::info!("📄 Processing document: {}", document.name);

        let units = profiler.time_step("1. Text Extraction", || {
            crate::extractors::extract_text_units(document)
        })?;

        tracing::info!("🔍 Analyzing {} comments...", units.len());
        let table = profiler.time_step("2. Classification", || self.classify_units(&units));

        tracing::info!(
            "⏱️  Total processing time: {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(table)
    }

    /// Process a document and capture every intermediate stage
    pub fn capture_stages(&self, document: &RawDocument) -> AnalyzerResult<PipelineStages> {
        let extractor = Extractor::for_format(document.format)?;

        // Stage 1a: document → raw strings
        let raw_texts = extractor.extract_raw(&document.bytes)?;
        tracing::info!("📋 Stage 1a: {} raw strings captured", raw_texts.len());

        // Stage 1b: raw strings → TextUnits
        let text_units = crate::extractors::clean_units(&raw_texts);
        tracing::info!("📋 Stage 1b: {} text units captured", text_units.len());

        // Stage 2: TextUnits → ResultTable
        let table = self.classify_units(&text_units);
        tracing::info!("📋 Stage 2: {} results captured", table.len());

        Ok(PipelineStages {
            document_name: document.name.clone(),
            format: document.format,
            raw_texts,
            text_units,
            table,
        })
    }
}
