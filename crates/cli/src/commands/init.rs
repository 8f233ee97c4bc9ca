//! Init command implementation

use clap::Args;
use qagen_core::{QagenConfig, QagenError, Result};
use std::path::PathBuf;

use super::CliCommand;
use crate::config::CliContext;

/// Write a default configuration file
#[derive(Debug, Clone, Args)]
pub struct InitCommand {
    /// Configuration file to create
    #[arg(short, long, default_value = "qagen.yaml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,

    /// Model name to put in the file
    #[arg(long)]
    pub model: Option<String>,
}

impl CliCommand for InitCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = self.write()?;

        let mut out = ctx.formatter();
        out.success(&format!(
            "Configuration written to {} (model {})",
            self.path.display(),
            config.model.name
        ))?;
        out.message(&format!(
            "Run 'qagen validate {}' after editing it",
            self.path.display()
        ))
    }

    fn name(&self) -> &'static str {
        "init"
    }

    fn validate(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            return Err(QagenError::validation(format!(
                "Configuration already exists: {}. Use --force to overwrite.",
                self.path.display()
            )));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(QagenError::validation("Model name cannot be empty"));
            }
        }
        Ok(())
    }
}

impl InitCommand {
    /// Build the default configuration and save it
    pub fn write(&self) -> Result<QagenConfig> {
        let mut config = QagenConfig::default();
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        config.validate()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        config.to_file(&self.path)?;
        Ok(config)
    }
}
