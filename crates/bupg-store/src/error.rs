use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested record does not exist in its collection.
    #[error("Record not found")]
    NotFound,

    /// A record with the same id already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Running in a hosted context without any key-value store configured.
    #[error("Storage is not configured: {0}")]
    Unconfigured(String),

    /// The caller handed us a record that breaks a model invariant.
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// Local filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure talking to a remote key-value store.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote key-value store answered with an error.
    #[error("Remote store error: {0}")]
    Remote(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
