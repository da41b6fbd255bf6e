//! OpenTale CLI binary.
//!
//! This binary drives the writing pipeline from the terminal:
//! - Generate world, characters, outline and chapters, streaming to stdout
//! - Chat with conversational stages
//! - Save manually edited artifacts and inspect the project

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, execute};

    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    execute(cli).await
}
