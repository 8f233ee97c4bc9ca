//! Route table and service metadata endpoints

use crate::handlers::{
    handle_generate_qa, handle_generator, handle_preprocess_and_chunk,
    handle_validate_and_deduplicate, AppState,
};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

/// API routes configuration
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(get_version))
        .route("/preprocess-and-chunk", post(handle_preprocess_and_chunk))
        .route("/generate_qa", post(handle_generate_qa))
        .route("/validate_and_deduplicate", post(handle_validate_and_deduplicate))
        .route("/generator", post(handle_generator))
}

/// Health check endpoint
///
/// Reports `degraded` when the generation backend does not answer; the
/// service itself is still up.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let generator_reachable = state.pipeline.health_check().await;

    Json(HealthResponse {
        status: if generator_reachable { "healthy" } else { "degraded" }.to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now(),
        generator: state.pipeline.generator().backend_name().to_string(),
        generator_reachable,
    })
}

/// Get version information
pub async fn get_version() -> impl IntoResponse {
    Json(VersionResponse {
        version: crate::VERSION.to_string(),
        core_version: qagen_core::VERSION.to_string(),
    })
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub generator: String,
    pub generator_reachable: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
    pub core_version: String,
}
