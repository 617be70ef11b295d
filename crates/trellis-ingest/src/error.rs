//! Ingest error types.

use std::path::PathBuf;

use thiserror::Error;
use trellis_catalog::CatalogError;
use trellis_core::errors::CoreError;

/// Errors raised while resolving and assembling catalog entities.
///
/// Only [`IngestError::Authentication`] and [`IngestError::Sink`] stop a run;
/// everything else skips the entity at hand.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The column carries neither `casDataType` nor `dataType`.
    #[error("column '{column}' has no casDataType or dataType attribute")]
    MissingType { column: String },

    /// The datatype string could not be parsed.
    #[error("cannot parse data type '{raw}': {reason}")]
    TypeParse { raw: String, reason: String },

    /// The catalog has nothing at the requested path or id.
    #[error("catalog resource not found: {path}")]
    ResourceNotFound { path: String },

    /// No relationship path leads from the table to a data store.
    #[error("no data store reachable from table {table_id}")]
    AmbiguousLineage { table_id: String },

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Catalog(CatalogError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl IngestError {
    /// Whether the run must stop instead of skipping the current entity.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Sink(_))
    }
}

impl From<CatalogError> for IngestError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { path } => Self::ResourceNotFound { path },
            CatalogError::Unauthorized(message) => Self::Authentication(message),
            other => Self::Catalog(other),
        }
    }
}

/// Errors raised by an [`EntitySink`](crate::sink::EntitySink).
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_not_found_maps_to_resource_not_found() {
        let error = IngestError::from(CatalogError::NotFound {
            path: "/catalog/instances/x".into(),
        });
        assert!(matches!(error, IngestError::ResourceNotFound { ref path } if path == "/catalog/instances/x"));
        assert!(!error.is_fatal());
    }

    #[test]
    fn unauthorized_is_fatal() {
        let error = IngestError::from(CatalogError::Unauthorized("bad password".into()));
        assert!(matches!(error, IngestError::Authentication(_)));
        assert!(error.is_fatal());
    }

    #[test]
    fn other_catalog_errors_are_skippable() {
        let error = IngestError::from(CatalogError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(error, IngestError::Catalog(_)));
        assert!(!error.is_fatal());
    }

    #[test]
    fn sink_errors_are_fatal() {
        let error = IngestError::from(SinkError::Io {
            path: PathBuf::from("/nope/entities.jsonl"),
            source: std::io::Error::other("disk full"),
        });
        assert!(error.is_fatal());
        assert!(error.to_string().contains("entities.jsonl"));
    }
}
