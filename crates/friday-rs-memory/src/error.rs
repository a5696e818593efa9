//! Error types for memory operations.

/// Errors returned by memory stores and storage backends.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Storage key cannot be mapped onto the backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    /// Backend-specific failure (quota, connectivity).
    #[error("storage backend error: {0}")]
    Backend(String),
}
