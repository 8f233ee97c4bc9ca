//! Ollama client used for generation and embeddings

use super::{transport_error, DecodingParams, TextGenerator};
use crate::error::{QagenError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const SERVICE: &str = "ollama";

/// Ollama client for interacting with the Ollama API
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new Ollama client with a 30 second timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a client with custom timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Get the base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama server is accessible
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }

    /// Generate text using a model
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        debug!("Generating with model: {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(QagenError::unavailable(
                SERVICE,
                format!("Generate request failed: HTTP {}", response.status()),
            ));
        }

        // Non-streaming requests return one object, streaming ones JSONL
        let response_text = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let mut generated_text = String::new();
        for line in response_text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let generate_response: GenerateResponse = serde_json::from_str(line)
                .map_err(|_| QagenError::unexpected_output(line.to_string()))?;

            generated_text.push_str(&generate_response.response);

            if generate_response.done {
                break;
            }
        }

        debug!("Generated {} characters of text", generated_text.len());
        Ok(generated_text)
    }

    /// Generate embeddings for text
    pub async fn embed(&self, request: EmbedRequest) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        debug!("Generating embeddings with model: {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(QagenError::unavailable(
                SERVICE,
                format!("Embed request failed: HTTP {}", response.status()),
            ));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            QagenError::embedding(format!("Failed to parse embed response: {}", e))
        })?;

        Ok(embed_response.embedding)
    }
}

/// Request for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Generation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl From<&DecodingParams> for GenerateOptions {
    fn from(params: &DecodingParams) -> Self {
        // Greedy decoding maps to temperature zero
        let temperature = if params.do_sample {
            params.temperature
        } else {
            Some(0.0)
        };

        Self {
            temperature,
            num_predict: params.max_new_tokens.map(|n| n as i32),
            top_k: params.top_k.map(|k| k as i32),
            top_p: params.top_p,
        }
    }
}

/// Response from text generation
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Request for embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub prompt: String,
}

/// Response from embeddings
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// [`TextGenerator`] backed by an Ollama model
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn generate(&self, prompts: &[String], params: &DecodingParams) -> Result<Vec<Value>> {
        if params.uses_beams() {
            debug!(
                num_beams = ?params.num_beams,
                "Ollama does not support beam search, ignoring beam options"
            );
        }

        let options = GenerateOptions::from(params);
        let mut records = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            let text = self
                .client
                .generate(GenerateRequest {
                    model: self.model.clone(),
                    prompt: prompt.clone(),
                    stream: false,
                    options: Some(options.clone()),
                })
                .await?;
            records.push(json!({ "generated_text": text }));
        }

        info!(prompts = prompts.len(), model = %self.model, "Ollama generation finished");
        Ok(records)
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await
    }
}
