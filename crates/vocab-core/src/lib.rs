//! # vocab-core
//!
//! Spaced repetition vocabulary trainer engine for te reo Māori.
//!
//! ## Features
//!
//! - FSRS-5 review scheduling with learning and relearning steps
//! - Multiple-choice, true/false, listening and proverb quizzes
//! - Read-only content catalog loaded from JSON datasets
//! - Progress statistics: streaks, accuracy and upcoming reviews
//! - SQLite progress store and weekly word batches

pub mod batch;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod progress;
pub mod quiz;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod text;

pub use catalog::{Catalog, IntegrityIssue, PackCategory};
pub use config::Config;
pub use db::SqliteStore;
pub use error::{CatalogError, ConfigError, StoreError};
pub use models::{
    CardState, LearnerSettings, MemoryCard, Proverb, QuestionType, QuizPack, QuizResult, Rating,
    Topic, VocabularyItem,
};
pub use progress::{DayCount, ProgressSummary, StreakInfo};
pub use quiz::{generate_quiz, QuestionKind, QuizGenerator, QuizQuestion};
pub use scheduler::{is_due, rating_for_outcome, Fsrs, FsrsParameters, SrsAlgorithm};
pub use session::{AnswerOutcome, QuizSession};
pub use store::{MemoryStore, ProgressStore};
