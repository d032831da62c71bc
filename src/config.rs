//! Static run configuration, resolved once from the environment.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};

/// Everything the pipeline needs to know up front. Nothing here is
/// recomputed at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source audio/video file
    pub input_path: PathBuf,
    /// Directory for temporary chunk files
    pub chunk_dir: PathBuf,
    /// Resumption checkpoint file
    pub progress_path: PathBuf,
    /// Plain-text transcript output
    pub transcript_text_path: PathBuf,
    /// JSON transcript output with global word timings
    pub transcript_json_path: PathBuf,
    /// Interval report output
    pub intervals_path: PathBuf,
    /// Per-chunk size budget in bytes
    pub max_chunk_bytes: u64,
    /// Interval report window width
    pub interval_minutes: u32,
    /// Recognition language sent to the API
    pub language: String,
    /// Model name sent to the API
    pub model: String,
    /// Bearer token for the API
    pub api_key: String,
    /// Override for the API base URL (tests, proxies)
    pub api_base_url: Option<String>,
    /// Advance the merge offset by chunk duration on silent chunks instead
    /// of holding it
    pub advance_offset_on_silence: bool,
}

impl Config {
    /// Resolve configuration from environment variables, with the
    /// historical defaults for everything but the API key.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("WHISPER_API_KEY")
            .context("Set WHISPER_API_KEY environment variable")?;

        let max_chunk_mb: u64 = env_or("MAX_CHUNK_MB", "24")
            .parse()
            .context("MAX_CHUNK_MB must be a whole number of megabytes")?;
        if max_chunk_mb == 0 {
            bail!("MAX_CHUNK_MB must be at least 1");
        }

        let interval_minutes: u32 = env_or("INTERVAL_MINUTES", "1")
            .parse()
            .context("INTERVAL_MINUTES must be a whole number of minutes")?;
        if interval_minutes == 0 {
            bail!("INTERVAL_MINUTES must be at least 1");
        }

        Ok(Self {
            input_path: env_or("AUDIO_PATH", "input.wav").into(),
            chunk_dir: env_or("CHUNK_DIR", "temp_chunks").into(),
            progress_path: env_or("PROGRESS_FILE", "transcription_progress.json").into(),
            transcript_text_path: env_or("TRANSCRIPT_TEXT_PATH", "transcription.txt").into(),
            transcript_json_path: env_or(
                "TRANSCRIPT_JSON_PATH",
                "transcription_timestamps.json",
            )
            .into(),
            intervals_path: env_or("INTERVALS_PATH", "transcription_by_intervals.txt").into(),
            max_chunk_bytes: max_chunk_mb * 1024 * 1024,
            interval_minutes,
            language: env_or("LANGUAGE", "sl"),
            model: env_or("MODEL", "whisper-1"),
            api_key,
            api_base_url: std::env::var("WHISPER_API_BASE").ok(),
            advance_offset_on_silence: env_or("ADVANCE_OFFSET_ON_SILENCE", "false") == "true",
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
