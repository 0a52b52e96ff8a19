//! Trellis CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Live parent/child hierarchy index for a markdown vault", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Vault root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index once and report what it found
    Index,
    /// Render the hierarchy as an indented tree
    Tree {
        /// Include documents filed under the hidden root
        #[arg(long)]
        hidden: bool,
    },
    /// List referencing cycles
    Cycles,
    /// Watch the vault and keep the index live until interrupted
    Watch,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "trellis={0},trellis_core={0},trellis_indexer={0},trellis_vault={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Trellis v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Vault root: {}", cli.root.display());

    match cli.command {
        Commands::Index => commands::index(cli.root).await,
        Commands::Tree { hidden } => commands::tree(cli.root, hidden).await,
        Commands::Cycles => commands::cycles(cli.root).await,
        Commands::Watch => commands::watch(cli.root).await,
        Commands::Version => {
            println!("Trellis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
