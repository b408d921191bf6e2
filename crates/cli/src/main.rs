//! Switchyard CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Execute one turn against a recorded model response
//! - `commands` — List registered commands and their documentation
//! - `config`   — Show, locate or initialize the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "switchyard",
    about = "Switchyard — streaming command runtime for LLM agents",
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
    /// Execute one turn against a recorded model response
    Run {
        /// Read the response from this file instead of stdin
        #[arg(short, long)]
        input: Option<std::path::PathBuf>,

        /// Bytes per simulated stream chunk
        #[arg(long, default_value_t = 64)]
        chunk_size: usize,

        /// Print the full turn report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered commands and their documentation
    Commands,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the resolved configuration as TOML
    Show,

    /// Print the config file path
    Path,

    /// Write a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            input,
            chunk_size,
            json,
        } => commands::run::run(input, chunk_size, json).await?,
        Commands::Commands => commands::list::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
