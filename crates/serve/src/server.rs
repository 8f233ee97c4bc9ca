//! Server module for qagen serve crate

use crate::api::create_routes;
use crate::handlers::AppState;
use crate::middleware::request_context;
use crate::ServerConfig;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware, Router,
};
use qagen_core::{QaPipeline, QagenConfig, QagenError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// qagen HTTP server
pub struct QagenServer {
    config: ServerConfig,
    app: Router,
}

impl QagenServer {
    /// Create a server around an already built pipeline
    pub fn new(config: ServerConfig, pipeline: Arc<QaPipeline>) -> Self {
        let app = create_app(&config, AppState::new(pipeline));
        Self { config, app }
    }

    /// Start the server and run until Ctrl+C
    pub async fn start(self) -> Result<()> {
        let addr = self.config.addr();
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| QagenError::validation(format!("Invalid address {}: {}", addr, e)))?;

        tracing::info!("Starting qagen server on {}", addr);

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router with all layers applied
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Create the Axum application with middleware
pub fn create_app(config: &ServerConfig, state: AppState) -> Router {
    let mut app = create_routes().with_state(state);

    app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_request_size)),
    );
    app = app.layer(middleware::from_fn(request_context));

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]);

        app = app.layer(cors);
    }

    app
}

/// Server builder for configuration
pub struct ServerBuilder {
    config: ServerConfig,
    pipeline_config: QagenConfig,
    pipeline: Option<Arc<QaPipeline>>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::from_config(QagenConfig::default())
    }

    /// Start from the `server` section of `config`; the rest drives the pipeline
    pub fn from_config(config: QagenConfig) -> Self {
        Self {
            config: ServerConfig::from(&config.server),
            pipeline_config: config,
            pipeline: None,
        }
    }

    /// Set the host address
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.cors_enabled = enabled;
        self
    }

    /// Set maximum request size
    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    /// Serve an existing pipeline instead of building one from configuration
    pub fn pipeline(mut self, pipeline: Arc<QaPipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Build the pipeline (if not supplied) and the server
    pub fn build(self) -> Result<QagenServer> {
        let pipeline = match self.pipeline {
            Some(pipeline) => pipeline,
            None => Arc::new(QaPipeline::from_config(&self.pipeline_config)?),
        };
        Ok(QagenServer::new(self.config, pipeline))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
