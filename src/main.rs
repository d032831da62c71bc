use anyhow::Context as _;
use dotenvy::dotenv;
use tracing::info;

mod chunk;
mod config;
mod media;
mod pipeline;
mod progress;
mod transcribe;
mod transcript;

use config::Config;
use media::FfmpegEngine;
use pipeline::{Pipeline, RunOutcome};
use transcribe::OpenAiTranscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = std::env::args().nth(1) {
        config.input_path = path.into();
    }

    info!(
        input = %config.input_path.display(),
        budget_bytes = config.max_chunk_bytes,
        interval_minutes = config.interval_minutes,
        "Starting transcription process"
    );

    let transcriber = OpenAiTranscriber::new(
        config.api_key.clone(),
        config.api_base_url.clone(),
        config.model.clone(),
        config.language.clone(),
    );
    let progress_path = config.progress_path.clone();
    let pipeline = Pipeline::new(config, FfmpegEngine, transcriber);

    match pipeline.run().await? {
        RunOutcome::Completed(summary) => {
            info!(
                chunks = summary.chunk_count,
                words = summary.word_count,
                duration_secs = summary.total_duration_secs,
                "Transcription completed successfully"
            );
        }
        RunOutcome::AlreadyCompleted => {
            println!(
                "Previous transcription was completed. Remove {} to start over.",
                progress_path.display()
            );
        }
    }

    Ok(())
}
