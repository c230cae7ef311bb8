//! Error types for seen-core operations.
//!
//! Unknown identities are not errors: lookups return `Option` and callers
//! render their own "no data" message.

use std::path::PathBuf;

/// All errors that can occur in seen-core operations.
#[derive(Debug, thiserror::Error)]
pub enum SeenError {
    // ─────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Store file malformed: {path}: {details}")]
    MalformedStoreFile { path: PathBuf, details: String },

    #[error("Failed to write store file: {path}: {source}")]
    PersistenceWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Query Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Illegal argument: {0}")]
    ConflictingQueryArguments(String),

    #[error("Invalid player name: {0}")]
    InvalidIdentity(String),

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using SeenError.
pub type Result<T> = std::result::Result<T, SeenError>;

impl From<SeenError> for String {
    fn from(err: SeenError) -> String {
        err.to_string()
    }
}
