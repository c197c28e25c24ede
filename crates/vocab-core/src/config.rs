//! Configuration for the vocabulary trainer.

use crate::error::{ConfigError, ConfigResult};
use crate::models::QuestionType;
use crate::scheduler::{FsrsParameters, DEFAULT_WEIGHTS, MAX_INTERVAL_DAYS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_NAME: &str = "vocab-trainer";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!(error = %e, path = %path.display(), "Ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> ConfigResult<()> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|d| d.config_dir().join("config.toml"))
    }

    /// Database location: configured path, else the platform data dir.
    pub fn db_path(&self) -> Option<PathBuf> {
        self.paths.database.clone().or_else(|| {
            directories::ProjectDirs::from("", "", APP_NAME)
                .map(|d| d.data_dir().join("progress.db"))
        })
    }

    /// Content directory: configured path, else the platform data dir.
    pub fn content_dir(&self) -> Option<PathBuf> {
        self.paths.content_dir.clone().or_else(|| {
            directories::ProjectDirs::from("", "", APP_NAME).map(|d| d.data_dir().join("content"))
        })
    }

    pub fn to_fsrs_parameters(&self) -> FsrsParameters {
        let weights = match self.scheduler.weights.as_deref() {
            None => DEFAULT_WEIGHTS,
            Some(w) => w.try_into().unwrap_or_else(|_| {
                warn!(len = w.len(), "Scheduler weights need 19 values, using defaults");
                DEFAULT_WEIGHTS
            }),
        };
        let mut maximum_interval = self.scheduler.maximum_interval;
        if maximum_interval > MAX_INTERVAL_DAYS {
            warn!(maximum_interval, cap = MAX_INTERVAL_DAYS, "Maximum interval capped");
            maximum_interval = MAX_INTERVAL_DAYS;
        }
        FsrsParameters {
            weights,
            request_retention: self.scheduler.request_retention,
            maximum_interval,
            enable_short_term: self.scheduler.enable_short_term,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_retention")]
    pub request_retention: f64,
    #[serde(default = "default_maximum_interval")]
    pub maximum_interval: u32,
    #[serde(default = "default_true")]
    pub enable_short_term: bool,
    /// Custom FSRS-5 weights.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

fn default_retention() -> f64 { 0.9 }
fn default_maximum_interval() -> u32 { 36500 }
fn default_true() -> bool { true }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            maximum_interval: 36500,
            enable_short_term: true,
            weights: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_question_types")]
    pub question_types: Vec<QuestionType>,
    #[serde(default = "default_true")]
    pub include_review_words: bool,
    /// Upper bound on questions in a pack quiz.
    #[serde(default = "default_pack_cap")]
    pub pack_question_cap: usize,
}

fn default_question_count() -> usize { 10 }
fn default_question_types() -> Vec<QuestionType> { QuestionType::ALL.to_vec() }
fn default_pack_cap() -> usize { 30 }

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            question_types: default_question_types(),
            include_review_words: true,
            pack_question_cap: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_words_per_batch")]
    pub words_per_batch: u32,
    #[serde(default = "default_batch_interval")]
    pub batch_interval_days: u32,
}

fn default_words_per_batch() -> u32 { 10 }
fn default_batch_interval() -> u32 { 7 }

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            words_per_batch: 10,
            batch_interval_days: 7,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            request_retention = 0.85

            [quiz]
            question_types = ["true_false", "proverb_cloze"]
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.request_retention, 0.85);
        assert!(config.scheduler.enable_short_term);
        assert_eq!(config.quiz.question_count, 10);
        assert_eq!(
            config.quiz.question_types,
            vec![QuestionType::TrueFalse, QuestionType::ProverbCloze]
        );
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.batch.words_per_batch = 3;
        config.paths.database = Some(dir.path().join("db.sqlite"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.db_path(), Some(dir.path().join("db.sqlite")));
    }

    #[test]
    fn test_weights_override() {
        let mut config = Config::default();
        assert_eq!(config.to_fsrs_parameters(), FsrsParameters::default());

        config.scheduler.weights = Some(vec![1.0; 19]);
        assert_eq!(config.to_fsrs_parameters().weights, [1.0; 19]);

        config.scheduler.weights = Some(vec![1.0; 3]);
        assert_eq!(config.to_fsrs_parameters().weights, DEFAULT_WEIGHTS);
    }

    #[test]
    fn test_oversized_maximum_interval_is_capped() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            maximum_interval = 4294967295
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.maximum_interval, u32::MAX);
        assert_eq!(config.to_fsrs_parameters().maximum_interval, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Toml(_))));
    }
}
