//! docuchat - document text extraction and conversational analysis.
//!
//! Extracts readable text from images, PDFs and DOCX files, then analyzes
//! it through a chat-completion API with follow-up support.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docuchat::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "docuchat=info"
    } else {
        "docuchat=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
