//! Construction errors. Failures of individual calls are reported as
//! [`assetsync_core::RemoteOperationError`].

use thiserror::Error;

/// Errors creating a catalog client.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Credentials or identifiers are missing.
    #[error("catalog not configured: {0}")]
    NotConfigured(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for client construction.
pub type Result<T> = std::result::Result<T, CatalogError>;
