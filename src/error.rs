//! Unified error types.

use crate::config::ConfigError;

/// The error type returned by the service's fallible startup operations.
///
/// Request-level failures (400, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: loading config, binding to a port, accepting a
/// connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),
}

/// Errors raised by an [`ObjectStore`](crate::store::ObjectStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be mapped onto the backend (e.g. path traversal).
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend-specific failure.
    #[error("backend: {0}")]
    Backend(String),
}

/// Failures while serving an asset listing. All of them become a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("serialize asset list: {0}")]
    Serialize(#[from] serde_json::Error),
}
