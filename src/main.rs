//! qagen - question/answer pair generation from long documents
//!
//! Splits documents into model-sized chunks, asks a text-to-text model for a
//! question and an answer per chunk, scores the pairs and returns a curated,
//! deduplicated, ranked set. Runs one-shot from the command line or as an
//! HTTP service.

use clap::{Parser, Subcommand};
use qagen_cli::{
    execute_command, exit_code_for_error, ChunkCommand, CliContext, GenerateCommand, InitCommand,
    OutputFormat, ServeCommand, ValidateCommand, ValidateQasCommand,
};
use qagen_core::{QagenConfig, QagenError, Result};
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "qagen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate curated question/answer pairs from long documents")]
#[command(long_about = r#"
qagen turns raw text into question/answer pairs: the text is normalized and
split into token-bounded chunks, a text-to-text model writes one question and
one answer per chunk, every pair is scored for relevance, accuracy and
coherence, and the set is validated, deduplicated and ranked.

Configuration comes from built-in defaults, an optional --config file and
QAGEN_* environment variables, in that order.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (json, yaml, pretty, compact)
    #[arg(short, long, default_value = "pretty", global = true)]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, score and curate pairs for a document
    Generate(GenerateCommand),

    /// Show how a document is chunked
    Chunk(ChunkCommand),

    /// Validate, deduplicate and rank pairs from a JSON file
    ValidateQas(ValidateQasCommand),

    /// Run the HTTP service
    Serve(ServeCommand),

    /// Write a default configuration file
    Init(InitCommand),

    /// Check a configuration file
    Validate(ValidateCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(category = %e.category(), "{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(exit_code_for_error(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output: OutputFormat = cli.output.parse()?;
    let ctx = CliContext::new(cli.config.clone(), output, cli.verbose);

    init_logging(&cli, &ctx);
    debug!("Starting qagen v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Generate(cmd) => execute_command(cmd, &ctx).await,
        Commands::Chunk(cmd) => execute_command(cmd, &ctx).await,
        Commands::ValidateQas(cmd) => execute_command(cmd, &ctx).await,
        Commands::Serve(cmd) => execute_command(cmd, &ctx).await,
        Commands::Init(cmd) => execute_command(cmd, &ctx).await,
        Commands::Validate(cmd) => execute_command(cmd, &ctx).await,
        Commands::Version => handle_version(&ctx),
    }
}

/// The service logs as configured; one-shot commands log to stderr so
/// stdout carries only results
fn init_logging(cli: &Cli, ctx: &CliContext) {
    let result = if matches!(cli.command, Commands::Serve(_)) {
        let mut logging = ctx
            .load_config()
            .map(|config| config.logging)
            .unwrap_or_else(|_| QagenConfig::default().logging);
        if cli.verbose {
            logging.level = "debug".to_string();
        }
        qagen_core::init_logging_from_config(&logging)
    } else {
        init_stderr_logging(if cli.verbose { "debug" } else { "warn" })
    };

    if let Err(e) = result {
        eprintln!("Logging disabled: {}", e);
    }
}

fn init_stderr_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| QagenError::invalid_state(format!("logging already initialized: {}", e)))
}

fn handle_version(ctx: &CliContext) -> Result<()> {
    let info = serde_json::json!({
        "qagen": env!("CARGO_PKG_VERSION"),
        "core": qagen_core::VERSION,
        "serve": qagen_serve::VERSION,
        "cli": qagen_cli::VERSION,
    });

    let mut out = ctx.formatter();
    if ctx.output == OutputFormat::Pretty {
        out.message(&qagen_core::version_info())?;
        out.message(&format!("qagen-serve v{}", qagen_serve::VERSION))?;
        out.message(&format!("qagen-cli v{}", qagen_cli::VERSION))
    } else {
        out.output(&info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_with_globals() {
        let cli = Cli::try_parse_from([
            "qagen", "generate", "--input", "doc.txt", "--output", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.output, "json");
        assert!(matches!(cli.command, Commands::Generate(ref cmd) if cmd.input == PathBuf::from("doc.txt")));
    }

    #[test]
    fn test_parse_validate_qas() {
        let cli = Cli::try_parse_from(["qagen", "validate-qas", "--input", "pairs.json"]).unwrap();
        assert!(matches!(cli.command, Commands::ValidateQas(_)));
    }
}
