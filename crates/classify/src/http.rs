use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use docshelf_core::{Category, ClassificationResult, RetryStrategy};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::classifier::{Classifier, ClassifyRequest};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use crate::prompt::build_prompt;

/// HTTP classifier backed by an OpenAI-compatible chat completions API.
#[derive(Debug)]
pub struct HttpClassifier {
    client: reqwest::Client,
    config: ClassifierConfig,
}

/// Raw response schema the model is instructed to produce. `category` and
/// `confidence` are mandatory; the rest passes through with type checking
/// only.
#[derive(Debug, Deserialize)]
struct RawClassification {
    category: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    subcategory: Option<String>,
}

impl HttpClassifier {
    /// Create a new HTTP classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        if config.api_key.is_empty() {
            return Err(ClassifyError::Configuration("empty API key".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClassifyError::Configuration(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Parse the model's reply, stripping markdown code fences if present.
    fn parse_response(content: &str) -> Result<ClassificationResult, ClassifyError> {
        let trimmed = content.trim();

        // Strip markdown code fences (```json ... ``` or ``` ... ```)
        let json_str = if trimmed.starts_with("```") {
            let without_opening = if let Some(rest) = trimmed.strip_prefix("```json") {
                rest
            } else {
                trimmed.strip_prefix("```").unwrap_or(trimmed)
            };
            without_opening
                .strip_suffix("```")
                .unwrap_or(without_opening)
                .trim()
        } else {
            trimmed
        };

        let raw: RawClassification = serde_json::from_str(json_str).map_err(|e| {
            ClassifyError::InvalidResponse(format!(
                "failed to parse model reply as JSON: {e}. Raw content: {content}"
            ))
        })?;

        // Unknown category names normalize to Miscellaneous rather than
        // failing; an out-of-range confidence is a contract violation.
        let category = Category::normalize(&raw.category);
        ClassificationResult::new(category, raw.confidence, raw.reasoning, raw.subcategory)
            .map_err(|e| ClassifyError::InvalidResponse(e.to_string()))
    }

    /// One request/response cycle without retries.
    async fn request_once(&self, prompt: &str) -> Result<ClassificationResult, ClassifyError> {
        let request_body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt,
                }
            ]
        });

        debug!(endpoint = %self.config.endpoint, model = %self.config.model, "sending classification request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifyError::Timeout(self.config.timeout_seconds)
                } else {
                    ClassifyError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(status, "classification API returned error");
            return Err(ClassifyError::Api { status, message });
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            ClassifyError::InvalidResponse(format!("failed to parse API response: {e}"))
        })?;

        // Extract content from the OpenAI chat completions response shape.
        let content = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                ClassifyError::InvalidResponse(format!(
                    "unexpected response format: {response_json}"
                ))
            })?;

        Self::parse_response(content)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        request: &ClassifyRequest,
    ) -> Result<ClassificationResult, ClassifyError> {
        let prompt = build_prompt(request);
        with_retries(self.config.max_retries, &self.config.retry, || {
            self.request_once(&prompt)
        })
        .await
    }
}

/// Run `op`, retrying transient failures up to `max_retries` times with the
/// given backoff. Non-retryable errors surface immediately.
pub(crate) async fn with_retries<T, F, Fut>(
    max_retries: u32,
    strategy: &RetryStrategy,
    mut op: F,
) -> Result<T, ClassifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifyError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = strategy.delay_for(attempt);
                warn!(error = %e, attempt, ?delay, "classification attempt failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// -- Tests ------------------------------------------------------------------
