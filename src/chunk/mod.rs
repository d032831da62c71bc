//! Chunk planning and materialization.
//!
//! The plan is pure arithmetic over the file size and duration; turning it
//! into files on disk goes through the media engine and skips anything the
//! progress record already covers, so re-running after a partial failure
//! never re-splits finished chunks.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::media::{MediaEngine, MediaError};
use crate::progress::ProgressRecord;

/// One planned sub-range of the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChunk {
    pub index: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// The full chunk plan for one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    pub chunks: Vec<PlannedChunk>,
    /// Uniform chunk width; the last chunk may run longer to reach EOF.
    pub chunk_duration_secs: f64,
}

/// Compute the chunk plan: `floor(size / budget) + 1` uniform chunks
/// covering `[0, total_duration)`.
///
/// The extra chunk is deliberate even for exact multiples: the split is a
/// fragmentation policy keeping every chunk safely under the budget, not a
/// ceiling division. The last chunk extends to end-of-file regardless of
/// rounding drift.
pub fn plan(total_duration_secs: f64, file_size_bytes: u64, budget_bytes: u64) -> ChunkPlan {
    let num_chunks = (file_size_bytes / budget_bytes) as usize + 1;
    let chunk_duration_secs = total_duration_secs / num_chunks as f64;

    let chunks = (0..num_chunks)
        .map(|index| {
            let start_secs = index as f64 * chunk_duration_secs;
            let duration_secs = if index == num_chunks - 1 {
                total_duration_secs - start_secs
            } else {
                chunk_duration_secs
            };
            PlannedChunk {
                index,
                start_secs,
                duration_secs,
            }
        })
        .collect();

    ChunkPlan {
        chunks,
        chunk_duration_secs,
    }
}

/// Deterministic on-disk path for a planned chunk.
pub fn chunk_path(chunk_dir: &Path, index: usize) -> PathBuf {
    chunk_dir.join(format!("chunk_{index:03}.wav"))
}

/// Stable identifier for a chunk file, used as the progress record key.
pub fn chunk_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Split the source file according to the plan, returning chunk paths in
/// split order.
///
/// Chunks whose identifier already has a recorded result are not re-split;
/// their path is reused as-is. Safe to call repeatedly. A failed split
/// aborts the run, leaving earlier chunk files on disk for inspection.
pub fn materialize<M: MediaEngine>(
    plan: &ChunkPlan,
    source: &Path,
    chunk_dir: &Path,
    record: &ProgressRecord,
    engine: &M,
) -> Result<Vec<PathBuf>, MediaError> {
    let mut paths = Vec::with_capacity(plan.chunks.len());

    for chunk in &plan.chunks {
        let path = chunk_path(chunk_dir, chunk.index);

        if record.is_recorded(&chunk_id(&path)) {
            info!(
                chunk = chunk.index + 1,
                total = plan.chunks.len(),
                "Chunk already processed, skipping creation"
            );
            paths.push(path);
            continue;
        }

        info!(
            chunk = chunk.index + 1,
            total = plan.chunks.len(),
            path = %path.display(),
            "Creating chunk"
        );
        engine.extract_range(source, chunk.start_secs, chunk.duration_secs, &path)?;
        paths.push(path);
    }

    Ok(paths)
}
