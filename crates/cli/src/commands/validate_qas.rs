//! Validate-qas command: curate an existing set of generated pairs

use clap::Args;
use qagen_core::{GeneratedQa, QaPipeline, QagenError, Result};
use serde::Deserialize;
use std::path::PathBuf;

use super::{read_input, CliCommand};
use crate::config::CliContext;

/// Validate, deduplicate and rank pairs from a JSON file
///
/// The file holds either a list of pairs or an object with a `gqas` list,
/// the same body the service accepts.
#[derive(Debug, Clone, Args)]
pub struct ValidateQasCommand {
    /// JSON file with generated pairs
    #[arg(short, long)]
    pub input: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QaFile {
    List(Vec<GeneratedQa>),
    Wrapped { gqas: Vec<GeneratedQa> },
}

impl CliCommand for ValidateQasCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = ctx.load_config()?;
        let pipeline = QaPipeline::from_config(&config)?;

        let qas = parse_qas(&read_input(&self.input)?)?;
        let total = qas.len();
        let kept = pipeline.validate_and_deduplicate(qas).await?;

        tracing::info!(total, kept = kept.len(), "Curated pairs");
        ctx.formatter().output_qas(&kept)
    }

    fn name(&self) -> &'static str {
        "validate-qas"
    }

    fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(QagenError::validation(format!(
                "Input file not found: {}",
                self.input.display()
            )));
        }
        Ok(())
    }
}

/// Parse either accepted file shape
pub fn parse_qas(content: &str) -> Result<Vec<GeneratedQa>> {
    Ok(match serde_json::from_str(content)? {
        QaFile::List(qas) => qas,
        QaFile::Wrapped { gqas } => gqas,
    })
}
