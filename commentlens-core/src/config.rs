use crate::export::ExportFormat;
use crate::types::ClassifierKind;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_api_token_env() -> String {
    "HF_API_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_classifiers() -> Vec<ClassifierConfig> {
    vec![
        ClassifierConfig {
            kind: ClassifierKind::Sentiment,
            model: "distilbert-base-uncased-finetuned-sst-2-english".to_string(),
            enabled: true,
        },
        ClassifierConfig {
            kind: ClassifierKind::Toxicity,
            model: "unitary/toxic-bert".to_string(),
            enabled: true,
        },
        // Multi-class: never gets a positive/negative split
        ClassifierConfig {
            kind: ClassifierKind::Emotion,
            model: "bhadresh-savani/distilbert-base-uncased-emotion".to_string(),
            enabled: false,
        },
    ]
}

fn default_image_model() -> String {
    "google/vit-base-patch16-224".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_file_name() -> String {
    "Full_Analysis".to_string()
}

fn default_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Pdf]
}

fn default_console_classifier() -> ClassifierKind {
    ClassifierKind::Emotion
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Where hosted models are reached
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Text classifiers, in table column order
    #[serde(default = "default_classifiers")]
    pub classifiers: Vec<ClassifierConfig>,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Classifier used by the interactive console loop
    #[serde(default = "default_console_classifier")]
    pub console_classifier: ClassifierKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL; the model id is appended as a path segment
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token.
    /// The token itself never lives in the config file.
    #[serde(default = "default_api_token_env")]
    pub api_token_env: String,
    /// Per-request timeout. A timed out call is a classifier failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_token_env: default_api_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_model")]
    pub model: String,
    /// Number of labels reported per image
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Base name of the exported files, without extension
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<ExportFormat>,
    /// TrueType font for the PDF report. When unset the CLI searches the
    /// usual locations for DejaVuSans.ttf.
    #[serde(default)]
    pub font_path: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_name: default_file_name(),
            formats: default_formats(),
            font_path: None,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            classifiers: default_classifiers(),
            image: ImageConfig::default(),
            export: ExportConfig::default(),
            console_classifier: default_console_classifier(),
        }
    }
}

impl AnalyzerConfig {
    /// Load config from file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: AnalyzerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("⚠️  Failed to load config from {}, using defaults: {e:#}", p);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for classifier in &self.classifiers {
            if !seen.insert(classifier.kind) {
                return Err(anyhow!(
                    "classifier '{}' is configured more than once",
                    classifier.kind
                ));
            }
            if classifier.model.trim().is_empty() {
                return Err(anyhow!("classifier '{}' has an empty model id", classifier.kind));
            }
        }
        if self.image.top_k == 0 {
            return Err(anyhow!("image.top_k must be at least 1"));
        }
        if self.export.file_name.trim().is_empty() {
            return Err(anyhow!("export.file_name must not be empty"));
        }
        Ok(())
    }

    /// Enabled text classifiers, in configured order
    pub fn enabled_classifiers(&self) -> impl Iterator<Item = &ClassifierConfig> {
        self.classifiers.iter().filter(|c| c.enabled)
    }

    pub fn model_for(&self, kind: ClassifierKind) -> Option<&str> {
        self.classifiers
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.model.as_str())
    }

    /// Enable exactly `kinds`, in the given order. Kinds missing from the
    /// config are added with their default model; repeated kinds are kept once.
    pub fn select_classifiers(&mut self, kinds: &[ClassifierKind]) {
        let defaults = default_classifiers();
        let mut selected: Vec<ClassifierConfig> = Vec::with_capacity(self.classifiers.len());
        for kind in kinds {
            if selected.iter().any(|c| c.kind == *kind) {
                continue;
            }
            let existing = self
                .classifiers
                .iter()
                .chain(defaults.iter())
                .find(|c| c.kind == *kind);
            if let Some(config) = existing {
                selected.push(ClassifierConfig {
                    enabled: true,
                    ..config.clone()
                });
            }
        }
        for config in &self.classifiers {
            if !kinds.contains(&config.kind) {
                selected.push(ClassifierConfig {
                    enabled: false,
                    ..config.clone()
                });
            }
        }
        self.classifiers = selected;
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }
}
