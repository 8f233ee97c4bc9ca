//! Client for HTTP text2text inference services
//!
//! Speaks the HuggingFace inference payload: the request carries `inputs`
//! (one string or a list) and `parameters`, the response is a list of
//! `{"generated_text": ...}` records, possibly nested one level when the
//! service returns several sequences per input.

use super::{transport_error, DecodingParams, TextGenerator};
use crate::error::{QagenError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "text2text";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: InferenceInputs<'a>,
    parameters: &'a DecodingParams,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum InferenceInputs<'a> {
    One(&'a str),
    Many(&'a [String]),
}

/// Text2text inference client
#[derive(Debug, Clone)]
pub struct Text2TextClient {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl Text2TextClient {
    /// Create a client posting to `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_token: None,
        })
    }

    /// Send a bearer token with every request
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn flatten_records(body: Value) -> Result<Vec<Value>> {
        match body {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|item| match item {
                    Value::Array(mut nested) if !nested.is_empty() => nested.swap_remove(0),
                    other => other,
                })
                .collect()),
            Value::Object(map) if map.contains_key("generated_text") => {
                Ok(vec![Value::Object(map)])
            }
            other => Err(QagenError::unexpected_output(other.to_string())),
        }
    }
}

#[async_trait]
impl TextGenerator for Text2TextClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn generate(&self, prompts: &[String], params: &DecodingParams) -> Result<Vec<Value>> {
        let inputs = match prompts {
            [single] => InferenceInputs::One(single),
            many => InferenceInputs::Many(many),
        };
        let request = InferenceRequest {
            inputs,
            parameters: params,
        };

        debug!(prompts = prompts.len(), endpoint = %self.endpoint, "Sending text2text request");

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "text2text request failed");
            return Err(QagenError::unavailable(
                SERVICE,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let body: Value =
            serde_json::from_str(&text).map_err(|_| QagenError::unexpected_output(text.clone()))?;

        Self::flatten_records(body)
    }

    async fn health_check(&self) -> bool {
        match self.client.get(&self.endpoint).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!("text2text health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: String) -> Text2TextClient {
        Text2TextClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_flatten_nested_records() {
        let body = json!([[{"generated_text": "a"}, {"generated_text": "b"}], {"generated_text": "c"}]);
        let records = Text2TextClient::flatten_records(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["generated_text"], "a");
        assert_eq!(records[1]["generated_text"], "c");
    }

    #[test]
    fn test_flatten_rejects_unknown_shape() {
        let result = Text2TextClient::flatten_records(json!("plain text"));
        assert_matches!(result, Err(QagenError::UnexpectedOutputFormat { .. }));
    }

    #[tokio::test]
    async fn test_single_prompt_is_sent_as_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "inputs": "Question prompt",
                "parameters": {"do_sample": true}
            })))
            .with_status(200)
            .with_body(r#"[{"generated_text": "What is EcoTank?"}]"#)
            .create_async()
            .await;

        let records = client(server.url())
            .generate(
                &["Question prompt".to_string()],
                &DecodingParams::question_default(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records[0]["generated_text"], "What is EcoTank?");
    }

    #[tokio::test]
    async fn test_batch_prompts_are_sent_as_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "inputs": ["one", "two"],
                "parameters": {"num_beams": 5}
            })))
            .with_status(200)
            .with_body(r#"[{"generated_text": "1"}, {"generated_text": "2"}]"#)
            .create_async()
            .await;

        let records = client(server.url())
            .generate(
                &["one".to_string(), "two".to_string()],
                &DecodingParams::batch_answer_default(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .with_body(r#"{"error": "Model is loading"}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .generate(&["p".to_string()], &DecodingParams::default())
            .await
            .unwrap_err();
        assert_matches!(err, QagenError::CollaboratorUnavailable { .. });
    }

    #[tokio::test]
    async fn test_non_json_body_is_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client(server.url())
            .generate(&["p".to_string()], &DecodingParams::default())
            .await
            .unwrap_err();
        assert_matches!(err, QagenError::UnexpectedOutputFormat { .. });
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let err = client("http://127.0.0.1:1".to_string())
            .generate(&["p".to_string()], &DecodingParams::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
    }
}
