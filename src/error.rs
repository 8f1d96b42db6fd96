use thiserror::Error;

/// Unified error type for release-ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ledger write conflict: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience type alias for Results in release-ledger
pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        LedgerError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        LedgerError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        LedgerError::Tag(msg.into())
    }

    /// Create a ledger error with context
    pub fn ledger(msg: impl Into<String>) -> Self {
        LedgerError::Ledger(msg.into())
    }

    /// Create a write-conflict error with context
    pub fn conflict(msg: impl Into<String>) -> Self {
        LedgerError::Conflict(msg.into())
    }
}
