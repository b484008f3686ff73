use thiserror::Error;

/// Core error type shared across dbscaffold crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// `schema.json` could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by dbscaffold crates.
pub type Result<T> = std::result::Result<T, Error>;
