//! Entity emission sinks.
//!
//! A sink accepts fully-formed [`EntityRecord`]s and upserts them by
//! `(kind, key)`. Upserting the same record twice leaves the sink unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use trellis_core::entities::{EntityRecord, RecordKind};

use crate::error::SinkError;

/// File name of the snapshot written by [`JsonlSink`].
pub const SNAPSHOT_FILE: &str = "entities.jsonl";

type RecordKey = (RecordKind, String);

/// Destination for emitted entities.
pub trait EntitySink {
    /// Insert or replace the record stored under the same kind and key.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the record cannot be stored.
    fn upsert(&mut self, record: EntityRecord) -> Result<(), SinkError>;

    /// Persist buffered records.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if persisting fails.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: EntitySink + ?Sized> EntitySink for &mut S {
    fn upsert(&mut self, record: EntityRecord) -> Result<(), SinkError> {
        (**self).upsert(record)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

// ── MemorySink ─────────────────────────────────────────────────────

/// In-memory keyed store that also counts upsert calls per kind.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: BTreeMap<RecordKey, EntityRecord>,
    calls: BTreeMap<RecordKind, usize>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `upsert` calls made for `kind`, including repeats.
    #[must_use]
    pub fn upsert_calls(&self, kind: RecordKind) -> usize {
        self.calls.get(&kind).copied().unwrap_or(0)
    }

    /// Distinct records stored for `kind`.
    #[must_use]
    pub fn count(&self, kind: RecordKind) -> usize {
        self.records_of(kind).count()
    }

    pub fn records_of(&self, kind: RecordKind) -> impl Iterator<Item = &EntityRecord> {
        self.records
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .map(|(_, record)| record)
    }

    #[must_use]
    pub fn get(&self, kind: RecordKind, key: &str) -> Option<&EntityRecord> {
        self.records.get(&(kind, key.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntitySink for MemorySink {
    fn upsert(&mut self, record: EntityRecord) -> Result<(), SinkError> {
        *self.calls.entry(record.kind()).or_default() += 1;
        self.records.insert((record.kind(), record.key()), record);
        Ok(())
    }
}

// ── JsonlSink ──────────────────────────────────────────────────────

/// Snapshot of every emitted entity in `<output_dir>/entities.jsonl`.
///
/// The existing snapshot is loaded on open, upserts are applied in memory,
/// and the file is rewritten on [`flush`](EntitySink::flush) only if
/// something changed. Records are written in `(kind, key)` order so an
/// unchanged catalog produces a byte-identical file.
pub struct JsonlSink {
    path: PathBuf,
    records: BTreeMap<RecordKey, EntityRecord>,
    dirty: bool,
}

impl JsonlSink {
    /// Open (or start) the snapshot in `output_dir`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the directory cannot be created or the
    /// existing snapshot cannot be read or decoded.
    pub fn open(output_dir: &Path) -> Result<Self, SinkError> {
        std::fs::create_dir_all(output_dir).map_err(|source| SinkError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let path = output_dir.join(SNAPSHOT_FILE);
        let io_error = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        let mut records = BTreeMap::new();
        if path.exists() {
            for record in serde_jsonlines::json_lines(&path).map_err(io_error)? {
                let record: EntityRecord = record.map_err(io_error)?;
                records.insert((record.kind(), record.key()), record);
            }
        }
        tracing::debug!(path = %path.display(), records = records.len(), "opened entity snapshot");

        Ok(Self {
            path,
            records,
            dirty: false,
        })
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntitySink for JsonlSink {
    fn upsert(&mut self, record: EntityRecord) -> Result<(), SinkError> {
        let key = (record.kind(), record.key());
        if self.records.get(&key) != Some(&record) {
            self.records.insert(key, record);
            self.dirty = true;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if !self.dirty {
            return Ok(());
        }
        serde_jsonlines::write_json_lines(&self.path, self.records.values()).map_err(|source| {
            SinkError::Io {
                path: self.path.clone(),
                source,
            }
        })?;
        self.dirty = false;
        tracing::info!(path = %self.path.display(), records = self.records.len(), "wrote entity snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::entities::{ServiceKind, ServiceRecord, SchemaRecord};

    fn service(name: &str) -> EntityRecord {
        EntityRecord::Service(ServiceRecord {
            name: name.into(),
            kind: ServiceKind::Database,
        })
    }

    fn schema(fqn: &str) -> EntityRecord {
        EntityRecord::Schema(SchemaRecord {
            name: "Public".into(),
            database_fqn: "cas.cas-shared-default".into(),
            fqn: fqn.into(),
        })
    }

    #[test]
    fn memory_sink_upserts_by_key_and_counts_calls() {
        let mut sink = MemorySink::new();
        sink.upsert(service("cas")).unwrap();
        sink.upsert(service("cas")).unwrap();
        sink.upsert(schema("cas.cas-shared-default.Public")).unwrap();

        assert_eq!(sink.upsert_calls(RecordKind::Service), 2);
        assert_eq!(sink.count(RecordKind::Service), 1);
        assert_eq!(sink.count(RecordKind::Schema), 1);
        assert_eq!(sink.upsert_calls(RecordKind::Table), 0);
        assert_eq!(sink.len(), 2);
        assert!(sink.get(RecordKind::Service, "cas").is_some());
    }

    #[test]
    fn jsonl_sink_roundtrips_through_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut sink = JsonlSink::open(dir.path()).unwrap();
            assert!(sink.is_empty());
            sink.upsert(service("cas")).unwrap();
            sink.upsert(schema("cas.cas-shared-default.Public")).unwrap();
            sink.flush().unwrap();
        }

        let reopened = JsonlSink::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.path(), dir.path().join(SNAPSHOT_FILE));
    }

    #[test]
    fn unchanged_rerun_leaves_snapshot_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonlSink::open(dir.path()).unwrap();
        sink.upsert(service("cas")).unwrap();
        sink.flush().unwrap();
        let first = std::fs::read_to_string(sink.path()).unwrap();

        let mut rerun = JsonlSink::open(dir.path()).unwrap();
        rerun.upsert(service("cas")).unwrap();
        assert!(!rerun.dirty);
        rerun.flush().unwrap();
        let second = std::fs::read_to_string(rerun.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.lines().count(), 1);
    }

    #[test]
    fn corrupt_snapshot_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "{not json}\n").unwrap();
        assert!(matches!(
            JsonlSink::open(dir.path()),
            Err(SinkError::Io { .. })
        ));
    }
}
