//! HTTP handlers for the pipeline operations

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use qagen_core::{ContextInput, GeneratedQa, QaPipeline, QagenError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers
///
/// The pipeline is built once at startup; handlers only borrow it.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<QaPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<QaPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Pipeline failure rendered as `{ "status": u16, "detail": str }`
#[derive(Debug)]
pub struct ApiError(pub QagenError);

impl From<QagenError> for ApiError {
    fn from(error: QagenError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(QagenError::validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), category = %self.0.category(), "{}", self.0);
        } else {
            tracing::warn!(status = status.as_u16(), category = %self.0.category(), "{}", self.0);
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<PipelineResponse<T>>, ApiError>;

fn respond<T>(response: T) -> ApiResult<T> {
    Ok(Json(PipelineResponse { response }))
}

/// Handler for text normalization and chunking
pub async fn handle_preprocess_and_chunk(
    State(state): State<AppState>,
    payload: Result<Json<ChunkRequest>, JsonRejection>,
) -> ApiResult<Vec<String>> {
    let Json(request) = payload?;
    tracing::info!(chars = request.translated_context.len(), "Preprocess and chunk request");

    respond(state.pipeline.preprocess_and_chunk(&request.translated_context)?)
}

/// Handler for question/answer generation over ready contexts
pub async fn handle_generate_qa(
    State(state): State<AppState>,
    payload: Result<Json<ContextRequest>, JsonRejection>,
) -> ApiResult<Vec<GeneratedQa>> {
    let Json(request) = payload?;
    tracing::info!(contexts = request.context.len(), "Generate request");

    respond(state.pipeline.generate(request.context.into_contexts()).await?)
}

/// Handler for validation and deduplication of generated pairs
pub async fn handle_validate_and_deduplicate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Vec<GeneratedQa>> {
    let Json(request) = payload?;
    tracing::info!(pairs = request.gqas.len(), "Validate request");

    respond(state.pipeline.validate_and_deduplicate(request.gqas).await?)
}

/// Handler for the end-to-end run
pub async fn handle_generator(
    State(state): State<AppState>,
    payload: Result<Json<ContextRequest>, JsonRejection>,
) -> ApiResult<Vec<GeneratedQa>> {
    let Json(request) = payload?;
    tracing::info!(contexts = request.context.len(), "End-to-end request");

    respond(state.pipeline.run(request.context).await?)
}

// Request types

#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub translated_context: String,
}

/// One text or a list of pre-split contexts
#[derive(Debug, Serialize, Deserialize)]
pub struct ContextRequest {
    pub context: ContextInput,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub gqas: Vec<GeneratedQa>,
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineResponse<T> {
    pub response: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: QagenError) -> StatusCode {
        ApiError(error).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_of(QagenError::NoValidQa), StatusCode::GONE);
        assert_eq!(status_of(QagenError::AllDuplicates), StatusCode::GONE);
        assert_eq!(status_of(QagenError::empty_input("nothing")), StatusCode::GONE);
        assert_eq!(
            status_of(QagenError::unavailable("text2text", "connection refused")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(QagenError::timeout("generate")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(QagenError::validation("bad body")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(QagenError::unexpected_output("[]")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_request_accepts_text_or_list() {
        let single: ContextRequest = serde_json::from_str(r#"{"context": "One text."}"#).unwrap();
        assert_eq!(single.context, ContextInput::Text("One text.".to_string()));

        let many: ContextRequest = serde_json::from_str(r#"{"context": ["a", "b"]}"#).unwrap();
        assert_eq!(many.context.len(), 2);
    }

    #[test]
    fn test_validate_request_quality_is_optional() {
        let request: ValidateRequest = serde_json::from_str(
            r#"{"gqas": [{"context": "c", "question": "q", "answer": "a"}]}"#,
        )
        .unwrap();
        assert_eq!(request.gqas[0].quality, None);
    }
}
