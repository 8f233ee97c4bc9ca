//! Generate command: end-to-end question/answer generation for a document
//!
//! ```bash
//! # One long document, chunked with the configured strategy
//! qagen generate --input manual.txt
//!
//! # Pre-split contexts as a JSON array of strings
//! qagen generate --input contexts.json --chunked --output json
//! ```

use clap::Args;
use qagen_core::config::GenerationMode;
use qagen_core::{ChunkStrategy, ContextInput, GeneratedQa, QaPipeline, QagenConfig, QagenError, Result};
use std::path::PathBuf;

use super::{read_input, CliCommand};
use crate::config::CliContext;

/// Generate curated question/answer pairs from a document
#[derive(Debug, Clone, Args)]
pub struct GenerateCommand {
    /// Input text file, or a JSON array of contexts with --chunked
    #[arg(short, long)]
    pub input: PathBuf,

    /// Treat the input as already chunked
    #[arg(long)]
    pub chunked: bool,

    /// Chunking strategy override (sentences, tokens, characters)
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Generation mode override (concurrent, batched)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Maximum chunks in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Also write the results as JSON to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

impl CliCommand for GenerateCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let mut config = ctx.load_config()?;
        self.apply_overrides(&mut config)?;
        let pipeline = QaPipeline::from_config(&config)?;

        let text = read_input(&self.input)?;
        let qas = self.generate(&pipeline, &text).await?;

        if let Some(path) = &self.save {
            std::fs::write(path, serde_json::to_string_pretty(&qas)?)?;
            tracing::info!(path = %path.display(), pairs = qas.len(), "Saved results");
        }

        ctx.formatter().output_qas(&qas)
    }

    fn name(&self) -> &'static str {
        "generate"
    }

    fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(QagenError::validation(format!(
                "Input file not found: {}",
                self.input.display()
            )));
        }
        if self.chunked && self.strategy.is_some() {
            return Err(QagenError::validation(
                "--strategy has no effect on already chunked input",
            ));
        }
        if let Some(strategy) = &self.strategy {
            strategy.parse::<ChunkStrategy>()?;
        }
        if let Some(mode) = &self.mode {
            parse_mode(mode)?;
        }
        if self.concurrency == Some(0) {
            return Err(QagenError::validation("--concurrency must be at least 1"));
        }
        Ok(())
    }
}

impl GenerateCommand {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut QagenConfig) -> Result<()> {
        if let Some(strategy) = &self.strategy {
            config.chunking.strategy = strategy.parse()?;
        }
        if let Some(mode) = &self.mode {
            config.generation.mode = parse_mode(mode)?;
        }
        if let Some(concurrency) = self.concurrency {
            config.generation.max_concurrency = concurrency;
        }
        Ok(())
    }

    /// Run the pipeline over the input text
    pub async fn generate(&self, pipeline: &QaPipeline, text: &str) -> Result<Vec<GeneratedQa>> {
        let input = if self.chunked {
            let contexts: Vec<String> = serde_json::from_str(text)?;
            ContextInput::Chunks(contexts)
        } else {
            ContextInput::Text(text.to_string())
        };
        pipeline.run(input).await
    }
}

fn parse_mode(mode: &str) -> Result<GenerationMode> {
    match mode.to_ascii_lowercase().as_str() {
        "concurrent" => Ok(GenerationMode::Concurrent),
        "batched" | "batch" => Ok(GenerationMode::Batched),
        other => Err(QagenError::validation(format!(
            "Unknown generation mode '{}'",
            other
        ))),
    }
}
