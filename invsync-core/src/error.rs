//! Error types for the invsync core library.

use thiserror::Error;

/// Top-level error type for all store and sync operations.
///
/// Codec-level faults (unknown materials, broken tag text, unknown
/// enchantments) never surface here: they are recovered inside the codec
/// and only logged.
#[derive(Error, Debug)]
pub enum SyncError {
    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store filter referenced a field or value the backend cannot query.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A player identity could not be used as a document key.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// The backing store refused or could not serve the request.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SyncError>;
