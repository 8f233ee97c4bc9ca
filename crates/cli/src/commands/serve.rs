//! Serve command implementation

use clap::Args;
use qagen_core::{QagenConfig, QagenError, Result};
use qagen_serve::ServerBuilder;

use super::CliCommand;
use crate::config::CliContext;

/// Start the qagen HTTP service
#[derive(Debug, Clone, Args)]
pub struct ServeCommand {
    /// Host address to bind to (overrides server.host)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to bind to (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Maximum request body size in bytes
    #[arg(long)]
    pub max_body_size: Option<usize>,

    /// Disable CORS headers
    #[arg(long)]
    pub no_cors: bool,
}

impl CliCommand for ServeCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let mut config = ctx.load_config()?;
        self.apply_overrides(&mut config);

        tracing::info!(
            host = %config.server.host,
            port = config.server.port,
            model = %config.model.name,
            backend = ?config.model.backend,
            "Starting qagen server"
        );

        ServerBuilder::from_config(config).build()?.start().await
    }

    fn name(&self) -> &'static str {
        "serve"
    }

    fn validate(&self) -> Result<()> {
        if self.port == Some(0) {
            return Err(QagenError::validation("Port cannot be 0"));
        }
        if self.max_body_size == Some(0) {
            return Err(QagenError::validation("Max body size cannot be 0"));
        }
        Ok(())
    }
}

impl ServeCommand {
    /// Apply command-line overrides to the `server` section
    pub fn apply_overrides(&self, config: &mut QagenConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(size) = self.max_body_size {
            config.server.max_request_size = size;
        }
        if self.no_cors {
            config.server.cors_enabled = false;
        }
    }
}
