//! Validate command implementation

use clap::Args;
use qagen_core::{QagenConfig, QagenError, Result};
use serde::Serialize;
use std::path::PathBuf;

use super::CliCommand;
use crate::config::{CliContext, OutputFormat};

/// Check a configuration file without running anything
#[derive(Debug, Clone, Args)]
pub struct ValidateCommand {
    /// Configuration file to validate
    #[arg(value_name = "CONFIG")]
    pub file: PathBuf,
}

/// Outcome of a configuration check
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ConfigSummary>,
}

/// Settings worth echoing back after a successful check
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub model: String,
    pub model_url: String,
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
    pub chunk_strategy: String,
    pub max_concurrency: usize,
    pub min_quality: f64,
    pub duplicate_threshold: f32,
    pub translation: bool,
}

impl From<&QagenConfig> for ConfigSummary {
    fn from(config: &QagenConfig) -> Self {
        let profile = config.model.profile();
        Self {
            model: config.model.name.clone(),
            model_url: config.model.url.to_string(),
            max_input_tokens: profile.max_tokens,
            max_output_tokens: profile.recommended_output_tokens,
            chunk_strategy: config.chunking.strategy.to_string(),
            max_concurrency: config.generation.max_concurrency,
            min_quality: config.quality.min_quality,
            duplicate_threshold: config.validation.duplicate_threshold,
            translation: config.translation.enabled,
        }
    }
}

impl CliCommand for ValidateCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let result = self.check();
        let report = match &result {
            Ok(config) => ValidationReport {
                valid: true,
                path: self.file.clone(),
                error: None,
                summary: Some(ConfigSummary::from(config)),
            },
            Err(e) => ValidationReport {
                valid: false,
                path: self.file.clone(),
                error: Some(e.to_string()),
                summary: None,
            },
        };

        let mut out = ctx.formatter();
        if ctx.output == OutputFormat::Pretty {
            match &report.summary {
                Some(summary) => {
                    out.success("Configuration is valid")?;
                    out.output(summary)?;
                }
                None => out.error(&format!(
                    "Configuration is invalid: {}",
                    report.error.as_deref().unwrap_or_default()
                ))?,
            }
        } else {
            out.output(&report)?;
        }

        result.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "validate"
    }

    fn validate(&self) -> Result<()> {
        if !self.file.exists() {
            return Err(QagenError::validation(format!(
                "Configuration file not found: {}",
                self.file.display()
            )));
        }
        Ok(())
    }
}

impl ValidateCommand {
    /// Parse and validate the file
    pub fn check(&self) -> Result<QagenConfig> {
        let config = QagenConfig::from_file(&self.file)?;
        config.validate()?;
        Ok(config)
    }
}
