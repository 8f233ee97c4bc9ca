//! CLI commands module

use crate::config::CliContext;
use qagen_core::Result;

pub mod chunk;
pub mod generate;
pub mod init;
pub mod serve;
pub mod validate;
pub mod validate_qas;

pub use chunk::ChunkCommand;
pub use generate::GenerateCommand;
pub use init::InitCommand;
pub use serve::ServeCommand;
pub use validate::ValidateCommand;
pub use validate_qas::ValidateQasCommand;

/// Base trait for CLI commands
#[allow(async_fn_in_trait)]
pub trait CliCommand {
    /// Execute the command
    async fn execute(&self, ctx: &CliContext) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;

    /// Validate command arguments
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Common command execution wrapper
pub async fn execute_command<T: CliCommand>(command: &T, ctx: &CliContext) -> Result<()> {
    tracing::info!("Executing command: {}", command.name());

    command.validate()?;
    command.execute(ctx).await?;

    tracing::info!("Command {} completed successfully", command.name());
    Ok(())
}

/// Read a whole input file, naming the path on failure
pub(crate) fn read_input(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        qagen_core::QagenError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qagen_core::QagenError;

    struct TestCommand {
        valid: bool,
    }

    impl CliCommand for TestCommand {
        async fn execute(&self, _ctx: &CliContext) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "test"
        }

        fn validate(&self) -> Result<()> {
            if self.valid {
                Ok(())
            } else {
                Err(QagenError::validation("invalid"))
            }
        }
    }

    #[tokio::test]
    async fn test_execute_command() {
        let ctx = CliContext::default();
        assert!(execute_command(&TestCommand { valid: true }, &ctx).await.is_ok());
        assert!(execute_command(&TestCommand { valid: false }, &ctx).await.is_err());
    }

    #[test]
    fn test_read_input_names_missing_file() {
        let err = read_input(std::path::Path::new("/nonexistent/input.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/input.txt"));
    }
}
