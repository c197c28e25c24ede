//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vocab_core::QuestionType;

#[derive(Parser)]
#[command(name = "vocab-trainer")]
#[command(about = "Te reo Māori vocabulary trainer with spaced repetition")]
#[command(version)]
pub struct Cli {
    /// Directory holding words.json, topics.json, packs.json and proverbs.json
    #[arg(long, global = true)]
    pub content_dir: Option<PathBuf>,

    /// Progress database path
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show progress statistics
    Stats,

    /// List words due for review
    Due,

    /// Run a quiz on the terminal
    Quiz {
        /// Number of questions
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Question types, comma separated (e.g. direct_choice,true_false)
        #[arg(long, value_delimiter = ',')]
        types: Vec<QuestionType>,

        /// Quiz every word of a pack instead of the current words
        #[arg(long)]
        pack: Option<String>,
    },

    /// Check content integrity
    Validate,

    /// Show the current word batch, starting a new one when due
    Batch,

    /// Add a word to the words being learned
    Add {
        /// Word id or text
        word: String,
    },

    /// Stop learning a word and forget its review history
    Remove {
        /// Word id or text
        word: String,
    },

    /// Show the next interval for each rating of a word
    Preview {
        /// Word id or text
        word: String,
    },

    /// Search the catalog
    Search {
        query: String,
    },
}
