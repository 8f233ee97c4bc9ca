//! qagen Serve Library
//!
//! HTTP interface for the qagen question/answer pipeline.

use qagen_core::config::ServerSettings;

pub mod api;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use handlers::{ApiError, AppState};
pub use server::{create_app, QagenServer, ServerBuilder};

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub max_request_size: usize,
}

impl ServerConfig {
    /// `host:port` the listener binds to
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSettings::default())
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            cors_enabled: settings.cors_enabled,
            max_request_size: settings.max_request_size,
        }
    }
}
