//! CLI parser and command dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "docuchat")]
#[command(about = "Document text extraction and conversational analysis")]
#[command(version)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a document and print it
    Extract {
        /// Document to process (pdf, docx, png, jpg)
        file: PathBuf,
    },

    /// Extract text from a document and run one analysis turn
    Analyze {
        /// Document to process
        file: PathBuf,
    },

    /// Analyze a document, then ask follow-up questions interactively
    Chat {
        /// Document to process
        file: PathBuf,
    },

    /// Check collaborator tool and model availability
    Check,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { file } => commands::cmd_extract(&settings, &file),
        Commands::Analyze { file } => commands::cmd_analyze(&settings, &file).await,
        Commands::Chat { file } => commands::cmd_chat(&settings, &file).await,
        Commands::Check => commands::cmd_check(&settings),
    }
}
