//! CLI configuration module

use qagen_core::{QagenConfig, QagenError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::OutputFormatter;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Pretty,
    Compact,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = QagenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            _ => Err(QagenError::validation(format!(
                "Invalid output format: {}",
                s
            ))),
        }
    }
}

/// Settings shared by every command, taken from the global flags
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    /// Configuration file given with `--config`
    pub config_path: Option<PathBuf>,
    /// Result format given with `--output`
    pub output: OutputFormat,
    pub verbose: bool,
}

impl CliContext {
    pub fn new(config_path: Option<PathBuf>, output: OutputFormat, verbose: bool) -> Self {
        Self {
            config_path,
            output,
            verbose,
        }
    }

    /// Defaults, then the `--config` file, then `QAGEN_*` environment overrides
    pub fn load_config(&self) -> Result<QagenConfig> {
        QagenConfig::load(self.config_path.as_deref())
    }

    /// Formatter writing to stdout in the selected format
    pub fn formatter(&self) -> OutputFormatter {
        OutputFormatter::with_format(self.output, true)
    }
}

/// Check if output supports colors
pub fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    atty::is(atty::Stream::Stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("YML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!(
            "pretty".parse::<OutputFormat>().unwrap(),
            OutputFormat::Pretty
        );

        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_context_loads_defaults_without_file() {
        let ctx = CliContext::default();
        let config = ctx.load_config().unwrap();
        assert_eq!(config.server.port, QagenConfig::default().server.port);
    }

    #[test]
    fn test_context_loads_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("qagen.yaml");

        let mut config = QagenConfig::default();
        config.validation.min_answer_chars = 12;
        config.to_file(&path).unwrap();

        let ctx = CliContext::new(Some(path), OutputFormat::Json, false);
        assert_eq!(ctx.load_config().unwrap().validation.min_answer_chars, 12);
    }

    #[test]
    fn test_context_missing_config_file_fails() {
        let ctx = CliContext::new(Some(PathBuf::from("/nonexistent/qagen.yaml")), OutputFormat::Json, false);
        assert!(ctx.load_config().is_err());
    }
}
