//! Catalog error types.

use thiserror::Error;
use trellis_config::ConfigError;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog has no resource at the requested path.
    #[error("not found: {path}")]
    NotFound {
        /// Request path that returned 404.
        path: String,
    },

    /// Credentials were rejected or the token exchange failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The catalog returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Catalog API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the catalog.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Failed to parse a catalog response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The connection settings are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
