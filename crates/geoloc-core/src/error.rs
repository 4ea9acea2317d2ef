// crates/geoloc-core/src/error.rs
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the importer, the store adapters and the query service.
///
/// Store failures keep their underlying cause (`#[from]`) so callers can log the
/// driver error while the HTTP layer only exposes a generic message.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid point: lon={lon}, lat={lat}")]
    InvalidPoint { lon: f64, lat: f64 },

    /// The query needs an index that has not been created yet.
    #[error("Index required for this query: {0}")]
    IndexMissing(&'static str),

    #[error("Operation '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Snapshot encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[cfg(feature = "mongo")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[cfg(feature = "fetch")]
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "fetch")]
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, GeoError>;
