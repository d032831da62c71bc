//! Durable per-chunk progress tracking.
//!
//! The progress file is the sole source of truth for resumability: one
//! entry per successfully transcribed chunk, flushed synchronously after
//! each chunk so a crash loses at most one chunk of work. Persistence goes
//! through a temp file plus atomic rename so a crash mid-write cannot
//! corrupt previously recorded chunks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::transcript::ChunkResult;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("failed to read progress file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("progress file {path} is corrupt, remove or fix it to continue: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write progress file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The persisted resumption checkpoint.
///
/// Chunk identifiers are the chunk file paths; they are zero-padded so
/// lexicographic key order equals split order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub processed_chunks: BTreeMap<String, ChunkResult>,
    #[serde(default)]
    pub completed: bool,
}

impl ProgressRecord {
    pub fn is_recorded(&self, chunk_id: &str) -> bool {
        self.processed_chunks.contains_key(chunk_id)
    }
}

/// Owner of the progress file. All reads and writes of progress state go
/// through here; callers never touch the JSON themselves.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record, or a fresh empty one if none exists.
    /// A missing file is "no prior progress", never an error.
    pub fn load(&self) -> Result<ProgressRecord, ProgressError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProgressRecord::default());
            }
            Err(e) => {
                return Err(ProgressError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&contents).map_err(|e| ProgressError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Record one chunk's result and persist the whole record.
    pub fn record_chunk(&self, chunk_id: &str, result: &ChunkResult) -> Result<(), ProgressError> {
        let mut record = self.load()?;
        record
            .processed_chunks
            .insert(chunk_id.to_string(), result.clone());
        self.persist(&record)?;
        info!(chunk_id, "Recorded chunk result");
        Ok(())
    }

    /// Flip the completion flag and persist.
    pub fn mark_completed(&self) -> Result<(), ProgressError> {
        let mut record = self.load()?;
        record.completed = true;
        self.persist(&record)
    }

    fn persist(&self, record: &ProgressRecord) -> Result<(), ProgressError> {
        let write_err = |source| ProgressError::Write {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(record).map_err(|e| ProgressError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Word;

    fn store_in(dir: &tempfile::TempDir) -> ProgressStore {
        ProgressStore::new(dir.path().join("progress.json"))
    }

    #[test]
    fn test_missing_file_loads_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = store_in(&dir).load().unwrap();
        assert!(record.processed_chunks.is_empty());
        assert!(!record.completed);
    }

    #[test]
    fn test_record_chunk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let result = ChunkResult {
            text: "hello world".to_string(),
            words: vec![Word::new("hello", 0.0, 0.5), Word::new("world", 0.5, 1.0)],
        };
        store.record_chunk("temp_chunks/chunk_000.wav", &result).unwrap();

        let record = store.load().unwrap();
        assert_eq!(record.processed_chunks.len(), 1);
        assert_eq!(
            record.processed_chunks["temp_chunks/chunk_000.wav"],
            result
        );
        assert!(!record.completed);
    }

    #[test]
    fn test_mark_completed_preserves_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .record_chunk("chunk_000.wav", &ChunkResult::default())
            .unwrap();
        store.mark_completed().unwrap();

        let record = store.load().unwrap();
        assert!(record.completed);
        assert!(record.is_recorded("chunk_000.wav"));
    }

    #[test]
    fn test_corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{not json").unwrap();

        let err = ProgressStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ProgressError::Corrupt { .. }));
    }

    #[test]
    fn test_keys_iterate_in_split_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.record_chunk("chunk_002.wav", &ChunkResult::default()).unwrap();
        store.record_chunk("chunk_000.wav", &ChunkResult::default()).unwrap();
        store.record_chunk("chunk_001.wav", &ChunkResult::default()).unwrap();

        let record = store.load().unwrap();
        let keys: Vec<_> = record.processed_chunks.keys().cloned().collect();
        assert_eq!(keys, vec!["chunk_000.wav", "chunk_001.wav", "chunk_002.wav"]);
    }
}
