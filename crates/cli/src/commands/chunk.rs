//! Chunk command: preview how a document is split before generation
//!
//! ```bash
//! qagen chunk --input manual.txt --strategy tokens
//! ```

use clap::Args;
use qagen_core::chunking::Chunker;
use qagen_core::{normalize, ChunkStrategy, QagenConfig, QagenError, Result};
use std::path::PathBuf;

use super::{read_input, CliCommand};
use crate::config::CliContext;

/// Normalize and chunk a document with the configured token budget
#[derive(Debug, Clone, Args)]
pub struct ChunkCommand {
    /// Input text file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Chunking strategy override (sentences, tokens, characters)
    #[arg(short, long)]
    pub strategy: Option<String>,
}

impl CliCommand for ChunkCommand {
    async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let config = ctx.load_config()?;
        let text = read_input(&self.input)?;
        let chunks = self.chunk(&config, &text)?;

        tracing::info!(chunks = chunks.len(), "Chunked {}", self.input.display());
        ctx.formatter().output_chunks(&chunks)
    }

    fn name(&self) -> &'static str {
        "chunk"
    }

    fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(QagenError::validation(format!(
                "Input file not found: {}",
                self.input.display()
            )));
        }
        if let Some(strategy) = &self.strategy {
            strategy.parse::<ChunkStrategy>()?;
        }
        Ok(())
    }
}

impl ChunkCommand {
    /// Chunks of `text` paired with their token counts
    pub fn chunk(&self, config: &QagenConfig, text: &str) -> Result<Vec<(String, usize)>> {
        let chunker = Chunker::from_config(&config.chunking, &config.model.profile())?;
        let strategy = match &self.strategy {
            Some(strategy) => strategy.parse()?,
            None => config.chunking.strategy,
        };

        let chunks = chunker.chunk_with(&normalize(text), strategy)?;
        if chunks.is_empty() {
            return Err(QagenError::empty_input("nothing to chunk after preprocessing"));
        }

        chunks
            .into_iter()
            .map(|chunk| {
                let tokens = chunker.count_tokens(&chunk)?;
                Ok((chunk, tokens))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn command(strategy: Option<&str>) -> ChunkCommand {
        ChunkCommand {
            input: PathBuf::from("unused.txt"),
            strategy: strategy.map(str::to_string),
        }
    }

    #[test]
    fn test_short_document_is_one_chunk() {
        let chunks = command(None)
            .chunk(&QagenConfig::default(), "One sentence.  Another\nsentence.")
            .unwrap();
        assert_eq!(chunks, vec![("One sentence. Another sentence.".to_string(), 4)]);
    }

    #[test]
    fn test_small_budget_splits_document() {
        let mut config = QagenConfig::default();
        config.model.max_input_tokens = Some(8);
        config.model.max_output_tokens = Some(2);
        config.chunking.min_sentence_chunk_tokens = 0;

        let text = "Alpha beta gamma delta. Epsilon zeta eta theta. Iota kappa lambda mu.";
        let chunks = command(Some("sentences")).chunk(&config, text).unwrap();
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|(_, tokens)| *tokens <= 8));
    }

    #[test]
    fn test_blank_document_is_empty_input() {
        let result = command(None).chunk(&QagenConfig::default(), " \n\t ");
        assert!(matches!(result, Err(QagenError::EmptyInput { .. })));
    }

    #[test]
    fn test_validate_checks_input_and_strategy() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Some text.").unwrap();

        let mut cmd = command(Some("paragraphs"));
        cmd.input = file.path().to_path_buf();
        assert!(cmd.validate().is_err());

        cmd.strategy = Some("chars".to_string());
        assert!(cmd.validate().is_ok());

        assert!(command(None).validate().is_err());
    }
}
