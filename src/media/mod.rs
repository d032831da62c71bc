//! External media engine: duration probing and sub-range extraction.
//!
//! The decode/encode work itself is a black box delegated to ffmpeg and
//! ffprobe on the PATH. The trait exists so the pipeline can be driven
//! with a fake engine in tests.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("failed to run {command}, is it installed?: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("{command} exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("could not parse duration from ffprobe output {output:?}")]
    ParseDuration { output: String },
}

/// Black-box media operations the pipeline needs from the outside world.
pub trait MediaEngine {
    /// Total duration of the media file in seconds.
    fn probe_duration(&self, source: &Path) -> Result<f64, MediaError>;

    /// Extract `[start, start + duration)` of `source` into a 16-bit PCM
    /// WAV file at `dest`, overwriting any existing file.
    fn extract_range(
        &self,
        source: &Path,
        start_secs: f64,
        duration_secs: f64,
        dest: &Path,
    ) -> Result<(), MediaError>;
}

/// ffmpeg/ffprobe subprocess implementation.
pub struct FfmpegEngine;

impl FfmpegEngine {
    fn run(&self, command: &str, args: &[&str]) -> Result<String, MediaError> {
        let output = Command::new(command)
            .args(args)
            .output()
            .map_err(|e| MediaError::Spawn {
                command: command.to_string(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(MediaError::Failed {
                command: command.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MediaEngine for FfmpegEngine {
    fn probe_duration(&self, source: &Path) -> Result<f64, MediaError> {
        let source = source.to_string_lossy();
        let stdout = self.run(
            "ffprobe",
            &[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                source.as_ref(),
            ],
        )?;

        parse_duration(&stdout)
    }

    fn extract_range(
        &self,
        source: &Path,
        start_secs: f64,
        duration_secs: f64,
        dest: &Path,
    ) -> Result<(), MediaError> {
        info!(
            source = %source.display(),
            dest = %dest.display(),
            start_secs,
            duration_secs,
            "Extracting chunk"
        );

        let source = source.to_string_lossy();
        let dest = dest.to_string_lossy();

        self.run(
            "ffmpeg",
            &[
                "-y",
                "-v",
                "error",
                "-ss",
                &format!("{start_secs}"),
                "-t",
                &format!("{duration_secs}"),
                "-i",
                source.as_ref(),
                "-acodec",
                "pcm_s16le",
                dest.as_ref(),
            ],
        )?;

        Ok(())
    }
}

fn parse_duration(ffprobe_output: &str) -> Result<f64, MediaError> {
    ffprobe_output
        .trim()
        .parse::<f64>()
        .map_err(|_| MediaError::ParseDuration {
            output: ffprobe_output.trim().to_string(),
        })
}
