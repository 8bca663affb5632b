//! Hosted inference backend
//!
//! Talks to a hosted model endpoint over blocking HTTP:
//!
//! - text:  `POST {endpoint}/{model}` with `{"inputs": "<text>"}`
//! - image: `POST {endpoint}/{model}` with the PNG-encoded image as the body
//!
//! Both answer with a list of `{"label", "score"}` objects, sometimes wrapped
//! in one extra list (one entry per input).

use crate::classifier::{ImageClassifier, TextClassifier};
use crate::config::{AnalyzerConfig, InferenceConfig};
use crate::errors::{AnalyzerError, AnalyzerResult};
use crate::types::{ClassifierKind, Prediction};
use image::DynamicImage;
use serde::Deserialize;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RawPrediction {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<RawPrediction>>),
    Flat(Vec<RawPrediction>),
}

/// Map a model response body to predictions, best first.
pub fn parse_predictions(body: serde_json::Value) -> Result<Vec<Prediction>, String> {
    if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
        return Err(message.to_string());
    }

    let raw = match serde_json::from_value::<InferenceResponse>(body) {
        Ok(InferenceResponse::Nested(mut outer)) => {
            if outer.is_empty() {
                Vec::new()
            } else {
                outer.swap_remove(0)
            }
        }
        Ok(InferenceResponse::Flat(flat)) => flat,
        Err(e) => return Err(format!("unexpected response shape: {e}")),
    };

    let mut predictions: Vec<Prediction> = raw
        .into_iter()
        .map(|p| Prediction::new(p.label, p.score))
        .collect();
    predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(predictions)
}

/// Shared HTTP client. One instance serves every hosted classifier of a run.
pub struct InferenceClient {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        let token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            tracing::warn!(
                "⚠️  {} is not set; requests are sent without an API token",
                config.api_token_env
            );
        }

        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint, model)
    }

    fn request(&self, model: &str) -> ureq::Request {
        let request = self.agent.post(&self.model_url(model));
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn read_response(
        model: &str,
        response: Result<ureq::Response, ureq::Error>,
    ) -> AnalyzerResult<Vec<Prediction>> {
        let response = response.map_err(|e| match e {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                AnalyzerError::classification(model, format!("HTTP {code}: {body}"))
            }
            other => AnalyzerError::classification(model, other),
        })?;

        let body: serde_json::Value = response
            .into_json()
            .map_err(|e| AnalyzerError::classification(model, e))?;
        parse_predictions(body).map_err(|e| AnalyzerError::classification(model, e))
    }

    pub fn classify_text(&self, model: &str, text: &str) -> AnalyzerResult<Vec<Prediction>> {
        let response = self
            .request(model)
            .send_json(serde_json::json!({ "inputs": text }));
        Self::read_response(model, response)
    }

    pub fn classify_png(&self, model: &str, png: &[u8]) -> AnalyzerResult<Vec<Prediction>> {
        let response = self
            .request(model)
            .set("Content-Type", "image/png")
            .send_bytes(png);
        Self::read_response(model, response)
    }
}

pub struct HostedTextClassifier {
    client: Arc<InferenceClient>,
    kind: ClassifierKind,
    model: String,
}

impl HostedTextClassifier {
    pub fn new(client: Arc<InferenceClient>, kind: ClassifierKind, model: impl Into<String>) -> Self {
        Self {
            client,
            kind,
            model: model.into(),
        }
    }

    /// One hosted classifier per enabled entry of the config, sharing a client
    pub fn from_config(config: &AnalyzerConfig) -> Vec<Box<dyn TextClassifier>> {
        let client = Arc::new(InferenceClient::new(&config.inference));
        config
            .enabled_classifiers()
            .map(|c| {
                Box::new(Self::new(Arc::clone(&client), c.kind, c.model.clone()))
                    as Box<dyn TextClassifier>
            })
            .collect()
    }
}

impl TextClassifier for HostedTextClassifier {
    fn kind(&self) -> ClassifierKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn classify(&self, text: &str) -> AnalyzerResult<Prediction> {
        self.client
            .classify_text(&self.model, text)?
            .into_iter()
            .next()
            .ok_or_else(|| AnalyzerError::classification(&self.model, "model returned no labels"))
    }
}

pub struct HostedImageClassifier {
    client: Arc<InferenceClient>,
    model: String,
}

impl HostedImageClassifier {
    pub fn new(client: Arc<InferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(
            Arc::new(InferenceClient::new(&config.inference)),
            config.image.model.clone(),
        )
    }
}

impl ImageClassifier for HostedImageClassifier {
    fn name(&self) -> &str {
        &self.model
    }

    fn classify_image(&self, image: &DynamicImage, top_k: usize) -> AnalyzerResult<Vec<Prediction>> {
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| AnalyzerError::classification(&self.model, e))?;

        let mut predictions = self.client.classify_png(&self.model, png.get_ref())?;
        predictions.truncate(top_k);
        Ok(predictions)
    }
}
