//! Error types for fieldwork-core

use thiserror::Error;

/// Result type alias using fieldwork-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldwork-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Required form fields missing before any network or storage attempt
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport failure reaching the works API (timeout, no connectivity)
    #[error("Network error: {0}")]
    Network(String),

    /// Works API answered with a non-2xx status
    #[error("Server rejected request (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    /// Offline queue could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or malformed client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Local validation failure; nothing was sent or stored
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Delivery failure that the offline queue can recover from
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }

    /// Failure of the durable queue itself
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Database(_) | Self::LibSql(_) | Self::Io(_)
        )
    }
}
