//! MedQCM CLI
//!
//! Command-line interface for MedQCM - QCM revision and exam practice for
//! medical students. Running without a subcommand starts the TUI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use medqcm_core::{seed, Config};

mod commands;
mod tui;

#[derive(Parser)]
#[command(name = "medqcm")]
#[command(about = "MedQCM - QCM revision and exam practice for medical students")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Print the year/semester/module tree
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate questions for a module with the AI service
    #[command(alias = "gen")]
    Generate {
        /// Module id or name
        module: String,
        /// How many questions to request
        #[arg(short, long)]
        count: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Tui) => tui::run().await,
        Some(Commands::List { json }) => {
            init_cli_logging();
            let store = seed::initial_store();
            commands::list(&store, json)
        }
        Some(Commands::Generate {
            module,
            count,
            json,
        }) => {
            init_cli_logging();
            let config = Config::load()?;
            let count = count.unwrap_or(config.generate_count);
            let store = seed::initial_store();
            commands::generate(&config, &store, &module, count, json).await
        }
    }
}

/// Initialize stderr logging for plain CLI subcommands
///
/// Only initializes if the MEDQCM_LOG environment variable is set, so
/// normal output stays clean.
fn init_cli_logging() {
    let Ok(level) = std::env::var("MEDQCM_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("medqcm_core={},medqcm_cli={}", level, level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
