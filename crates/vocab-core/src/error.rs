//! Error types.

use thiserror::Error;

/// Errors raised while loading static content.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset is not a valid JSON array of records.
    #[error("Malformed {dataset}: {source}")]
    Json {
        dataset: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value could not be decoded.
    #[error("Invalid stored value: {0}")]
    InvalidValue(String),
}

/// Errors raised while reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    /// No platform configuration directory is available.
    #[error("No configuration directory available")]
    NoConfigDir,
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
pub type StoreResult<T> = Result<T, StoreError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
