//! Cross-cutting error types for Trellis.
//!
//! Domain-specific errors (`CatalogError`, `IngestError`) live in their own
//! crates. This module only covers failures of the shared types themselves.

use thiserror::Error;

/// Errors that can be raised while building or validating core types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A fully-qualified name had no segments, or an empty segment.
    #[error("Invalid fully-qualified name: {0}")]
    InvalidFqn(String),

    /// A catalog payload did not have the expected shape.
    #[error("Malformed catalog payload: {0}")]
    MalformedPayload(String),

    /// JSON decoding of a catalog payload failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
