//! HTTP client for the external suggestion generation service

use super::candidate::{SuggestionCandidate, SuggestionCategory};
use super::generator::{GenerationRequest, GeneratorError, SuggestionGenerator};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request body sent to the generation service
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    #[serde(flatten)]
    request: &'a GenerationRequest,
}

/// Response body returned by the generation service
#[derive(Debug, Deserialize)]
struct SuggestionResponse {
    category: String,
    text: String,
    #[serde(default)]
    anonymized_context: String,
    #[serde(default)]
    priority: Option<u8>,
    #[serde(default)]
    confidence: Option<u8>,
}

/// Turn a raw response body into a well-formed candidate.
pub(crate) fn parse_suggestion(body: &str) -> std::result::Result<SuggestionCandidate, GeneratorError> {
    let response: SuggestionResponse = serde_json::from_str(body)
        .map_err(|e| GeneratorError::Malformed(format!("undecodable body: {}", e)))?;

    let category: SuggestionCategory = response
        .category
        .parse()
        .map_err(|e: Error| GeneratorError::Malformed(e.to_string()))?;

    let mut candidate = SuggestionCandidate::new(category, response.text, response.anonymized_context);
    if let Some(priority) = response.priority {
        candidate.priority = priority;
    }
    if let Some(confidence) = response.confidence {
        candidate.confidence = confidence;
    }
    candidate
        .check_well_formed()
        .map_err(GeneratorError::Malformed)?;
    Ok(candidate)
}

/// Generator backed by an external HTTP/JSON service.
pub struct HttpGenerator {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from configuration. Returns `None` when no endpoint is set.
    pub fn from_config(config: &GeneratorConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_ref() else {
            return Ok(None);
        };
        let api_key = Self::resolve_credential(&config.api_key_env)?;
        Ok(Some(Self::new(endpoint, api_key, &config.model)))
    }

    /// Resolve the bearer token from an environment variable
    fn resolve_credential(credential_ref: &str) -> Result<String> {
        std::env::var(credential_ref).map_err(|_| {
            Error::Config(format!(
                "Failed to resolve generator API key from env var: {}",
                credential_ref
            ))
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SuggestionGenerator for HttpGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<SuggestionCandidate, GeneratorError> {
        let body = GenerateBody {
            model: &self.model,
            request,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::Unavailable(format!(
                "service returned {}",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| GeneratorError::Unavailable(format!("failed to read body: {}", e)))?;
        parse_suggestion(&text)
    }

    fn name(&self) -> &str {
        "http"
    }
}
