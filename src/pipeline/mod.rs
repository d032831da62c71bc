//! Sequential pipeline driver.
//!
//! Splitting -> Transcribing -> Merging -> Regrouping -> Completed, one
//! chunk at a time, checkpointing after every transcription. Any error
//! aborts the run; chunk files and recorded results are kept so the next
//! invocation resumes from the first un-recorded chunk. Cleanup happens
//! only on the fully successful path.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::chunk::{self, ChunkPlan};
use crate::config::Config;
use crate::media::{MediaEngine, MediaError};
use crate::progress::{ProgressError, ProgressStore};
use crate::transcribe::{TranscribeError, Transcriber};
use crate::transcript::{
    ChunkResult, MergedTranscript, SilentChunkPolicy, merge_chunks, regroup,
    render_interval_report,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline stages, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Splitting,
    Transcribing,
    Merging,
    Regrouping,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Self::Splitting => "splitting",
            Self::Transcribing => "transcribing",
            Self::Merging => "merging",
            Self::Regrouping => "regrouping",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// A previous run already finished; nothing was touched. Remove the
    /// progress file to start over.
    AlreadyCompleted,
}

#[derive(Debug)]
pub struct RunSummary {
    pub chunk_count: usize,
    pub word_count: usize,
    pub total_duration_secs: f64,
}

pub struct Pipeline<M, T> {
    config: Config,
    media: M,
    transcriber: T,
    store: ProgressStore,
}

impl<M: MediaEngine, T: Transcriber> Pipeline<M, T> {
    pub fn new(config: Config, media: M, transcriber: T) -> Self {
        let store = ProgressStore::new(&config.progress_path);
        Self {
            config,
            media,
            transcriber,
            store,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let record = self.store.load()?;
        if record.completed {
            info!(
                progress_file = %self.store.path().display(),
                "Previous transcription was completed, refusing to re-run"
            );
            return Ok(RunOutcome::AlreadyCompleted);
        }

        if !self.config.input_path.is_file() {
            return Err(PipelineError::MissingInput(self.config.input_path.clone()));
        }

        fs::create_dir_all(&self.config.chunk_dir)?;

        let file_size = fs::metadata(&self.config.input_path)?.len();
        let (chunk_paths, plan) = if file_size > self.config.max_chunk_bytes {
            info!(
                stage = %Stage::Splitting,
                file_size,
                budget = self.config.max_chunk_bytes,
                "File exceeds size budget, splitting"
            );
            let total_duration = self.media.probe_duration(&self.config.input_path)?;
            let plan = chunk::plan(total_duration, file_size, self.config.max_chunk_bytes);
            info!(
                stage = %Stage::Splitting,
                chunks = plan.chunks.len(),
                chunk_secs = plan.chunk_duration_secs,
                "Computed chunk plan"
            );
            let paths = chunk::materialize(
                &plan,
                &self.config.input_path,
                &self.config.chunk_dir,
                &record,
                &self.media,
            )?;
            (paths, Some(plan))
        } else {
            // Small file: the source itself is the single chunk.
            (vec![self.config.input_path.clone()], None)
        };

        let results = self.transcribe_chunks(&chunk_paths).await?;

        info!(stage = %Stage::Merging, chunks = results.len(), "Merging transcriptions");
        let merged = merge_chunks(&results, self.silent_chunk_policy(plan.as_ref()));

        info!(stage = %Stage::Regrouping, words = merged.words.len(), "Regrouping into intervals");
        let total_duration_secs = merged.words.last().map(|w| w.end).unwrap_or(0.0);
        self.write_outputs(&merged, total_duration_secs)?;

        self.store.mark_completed()?;
        self.cleanup_chunk_dir();

        if let Some(word) = merged.words.first() {
            info!(
                text = %word.text,
                start = word.start,
                end = word.end,
                "First merged word"
            );
        }

        Ok(RunOutcome::Completed(RunSummary {
            chunk_count: chunk_paths.len(),
            word_count: merged.words.len(),
            total_duration_secs,
        }))
    }

    /// Transcribe each chunk in split order, reusing recorded results and
    /// checkpointing new ones immediately.
    async fn transcribe_chunks(
        &self,
        chunk_paths: &[PathBuf],
    ) -> Result<Vec<ChunkResult>, PipelineError> {
        let record = self.store.load()?;
        let mut results = Vec::with_capacity(chunk_paths.len());

        for (i, path) in chunk_paths.iter().enumerate() {
            let id = chunk::chunk_id(path);

            if let Some(existing) = record.processed_chunks.get(&id) {
                info!(
                    stage = %Stage::Transcribing,
                    chunk = i + 1,
                    total = chunk_paths.len(),
                    "Loading previously processed chunk"
                );
                results.push(existing.clone());
                continue;
            }

            info!(
                stage = %Stage::Transcribing,
                chunk = i + 1,
                total = chunk_paths.len(),
                path = %path.display(),
                "Transcribing chunk"
            );
            let result = self.transcriber.transcribe(path).await?;
            self.store.record_chunk(&id, &result)?;
            results.push(result);
        }

        Ok(results)
    }

    fn silent_chunk_policy(&self, plan: Option<&ChunkPlan>) -> SilentChunkPolicy {
        if self.config.advance_offset_on_silence {
            SilentChunkPolicy::Advance {
                chunk_duration_secs: plan.map(|p| p.chunk_duration_secs).unwrap_or(0.0),
            }
        } else {
            SilentChunkPolicy::HoldOffset
        }
    }

    fn write_outputs(
        &self,
        merged: &MergedTranscript,
        total_duration_secs: f64,
    ) -> Result<(), PipelineError> {
        fs::write(&self.config.transcript_text_path, &merged.text)?;
        info!(path = %self.config.transcript_text_path.display(), "Saved plain text transcript");

        let json = serde_json::to_string_pretty(merged)
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?;
        fs::write(&self.config.transcript_json_path, json)?;
        info!(path = %self.config.transcript_json_path.display(), "Saved timestamped transcript");

        let buckets = regroup(&merged.words, self.config.interval_minutes);
        let report = render_interval_report(&buckets, total_duration_secs);
        fs::write(&self.config.intervals_path, report)?;
        info!(
            path = %self.config.intervals_path.display(),
            intervals = buckets.len(),
            "Saved interval report"
        );

        Ok(())
    }

    /// Chunk files are only worth keeping while a resume is possible.
    fn cleanup_chunk_dir(&self) {
        if self.config.chunk_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.config.chunk_dir) {
                error!(
                    dir = %self.config.chunk_dir.display(),
                    "Failed to remove chunk directory: {e}"
                );
            }
        }
    }
}
