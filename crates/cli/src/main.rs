//! docchat CLI
//!
//! Serves the document chat web app and exposes the same knowledge base
//! operations (ingest, ask, stats, clear) on the command line.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ClearCommand, IngestCommand, ServeCommand, StatsCommand};
use docchat_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docchat - chat with your PDF, DOCX and CSV documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Ask questions about your documents with cited answers", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCCHAT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (huggingface, ollama)
    #[arg(short, long, global = true, env = "DOCCHAT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCCHAT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web chat app
    Serve(ServeCommand),

    /// Add documents to the knowledge base
    Ingest(IngestCommand),

    /// Ask a one-off question about the stored documents
    Ask(AskCommand),

    /// Show knowledge base statistics
    Stats(StatsCommand),

    /// Remove every stored document
    Clear(ClearCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Serve(_) => "serve",
            Commands::Ingest(_) => "ingest",
            Commands::Ask(_) => "ask",
            Commands::Stats(_) => "stats",
            Commands::Clear(_) => "clear",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} (model: {})", config.provider, config.model);
    tracing::debug!(
        "Embeddings: {} (model: {})",
        config.embedding.provider,
        config.embedding.model
    );

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_prompt::ResponseMode;

    #[test]
    fn test_parse_ask_with_globals() {
        let cli = Cli::try_parse_from([
            "docchat",
            "ask",
            "What is the refund window?",
            "--mode",
            "hybrid",
            "-k",
            "3",
            "--no-stream",
            "--model",
            "llama3.2",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("llama3.2"));
        match cli.command {
            Commands::Ask(cmd) => {
                assert_eq!(cmd.question, "What is the refund window?");
                assert_eq!(cmd.mode, ResponseMode::Hybrid);
                assert_eq!(cmd.top_k, Some(3));
                assert!(!cmd.is_streaming());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["docchat", "ingest"]).is_err());

        let cli = Cli::try_parse_from(["docchat", "ingest", "a.pdf", "b.csv", "--json"]).unwrap();
        match cli.command {
            Commands::Ingest(cmd) => {
                assert_eq!(cmd.files.len(), 2);
                assert!(cmd.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        assert!(Cli::try_parse_from(["docchat", "ask", "q", "--mode", "loose"]).is_err());
    }
}
