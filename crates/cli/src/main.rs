//! Heartline CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive empathetic chat or single-message mode
//! - `index`   — Inspect or populate the exemplar index
//! - `config`  — Print the current or default configuration

use clap::{Parser, Subcommand};

mod commands;
mod wiring;

#[derive(Parser)]
#[command(
    name = "heartline",
    about = "Heartline — an empathetic RAG chatbot",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the empathetic agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Manage the exemplar index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Show configuration
    Config {
        /// Print the built-in defaults instead of the loaded config
        #[arg(long)]
        defaults: bool,

        /// Print the config file path only
        #[arg(long, conflicts_with = "defaults")]
        path: bool,

        /// Validate the loaded config and report warnings
        #[arg(long, conflicts_with_all = ["defaults", "path"])]
        check: bool,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Show backend, location, and record count
    Status,

    /// Import exemplars from a JSONL file of {context, response, emotion} objects
    Import {
        /// Path to the JSONL file
        file: std::path::PathBuf,

        /// Records embedded and written per batch
        #[arg(long, default_value_t = commands::index::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Empty the collection before importing
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Index { action } => match action {
            IndexAction::Status => commands::index::status().await?,
            IndexAction::Import {
                file,
                batch_size,
                clear,
            } => commands::index::import(&file, batch_size, clear).await?,
        },
        Commands::Config {
            defaults,
            path,
            check,
        } => {
            if path {
                commands::config_cmd::path()?
            } else if defaults {
                commands::config_cmd::defaults()?
            } else if check {
                commands::config_cmd::validate()?
            } else {
                commands::config_cmd::show()?
            }
        }
    }

    Ok(())
}
