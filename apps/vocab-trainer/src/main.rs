//! Vocab Trainer - Learn te reo Māori vocabulary with spaced repetition.

mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut trainer = commands::Trainer::open(&cli)?;

    match cli.command {
        Commands::Stats => trainer.stats(),
        Commands::Due => trainer.due(),
        Commands::Quiz { count, types, pack } => trainer.quiz(count, types, pack.as_deref()),
        Commands::Validate => trainer.validate(),
        Commands::Batch => trainer.batch(),
        Commands::Add { word } => trainer.add(&word),
        Commands::Remove { word } => trainer.remove(&word),
        Commands::Preview { word } => trainer.preview(&word),
        Commands::Search { query } => trainer.search(&query),
    }
}
