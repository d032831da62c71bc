//! Remote speech-to-text client.
//!
//! One chunk in, one [`ChunkResult`] out. The duck-typed response shapes
//! the API returns (`word` vs `text` keys, optional `words` array) are
//! normalized right here at the boundary; nothing downstream branches on
//! key presence. Retry is deliberately not this layer's job: a transient
//! failure aborts the run and already-recorded chunks survive for resume.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart;
use thiserror::Error;
use tracing::{debug, info};

use crate::transcript::ChunkResult;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("failed to read chunk file {path}: {source}")]
    ReadChunk {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("transcription request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("transcription API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Port for the external transcription operation.
#[async_trait]
pub trait Transcriber {
    /// Transcribe one chunk file; word timings are on the chunk's local
    /// timeline.
    async fn transcribe(&self, chunk_path: &Path) -> Result<ChunkResult, TranscribeError>;
}

/// Client for an OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    language: String,
}

impl OpenAiTranscriber {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, chunk_path: &Path) -> Result<ChunkResult, TranscribeError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let audio = tokio::fs::read(chunk_path)
            .await
            .map_err(|e| TranscribeError::ReadChunk {
                path: chunk_path.to_path_buf(),
                source: e,
            })?;

        let file_name = chunk_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file_part = multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word")
            .part("file", file_part);

        debug!(model = %self.model, chunk = %chunk_path.display(), "Sending chunk to transcription API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscribeError::Api { status, body });
        }

        // Unknown response fields (task, language, segments, ...) are
        // ignored; word entries normalize through the serde alias.
        let result: ChunkResult = response.json().await?;

        info!(
            chunk = %chunk_path.display(),
            words = result.words.len(),
            "Chunk transcribed"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    async fn start_mock_server(
        response_status: u16,
        response_body: &'static str,
    ) -> (String, oneshot::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new().route(
            "/audio/transcriptions",
            post(move || async move {
                let status = axum::http::StatusCode::from_u16(response_status).unwrap();
                (status, response_body).into_response()
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .ok();
        });

        (base_url, shutdown_tx)
    }

    fn write_chunk(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("chunk_000.wav");
        std::fs::write(&path, b"fake audio bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_successful_response_normalizes_word_key() {
        let body = r#"{
            "task": "transcribe",
            "text": "hello world",
            "words": [
                {"word": "hello", "start": 0.0, "end": 0.4},
                {"word": "world", "start": 0.5, "end": 1.0}
            ]
        }"#;
        let (base_url, shutdown_tx) = start_mock_server(200, body).await;
        let dir = tempfile::tempdir().unwrap();

        let client = OpenAiTranscriber::new("test-key", Some(base_url), "whisper-1", "sl");
        let result = client.transcribe(&write_chunk(&dir)).await.unwrap();

        assert_eq!(result.text, "hello world");
        assert_eq!(result.words.len(), 2);
        assert_eq!(result.words[0].text, "hello");
        assert_eq!(result.words[1].end, 1.0);
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_error_status_carries_status_and_body() {
        let body = r#"{"error": {"message": "file too large"}}"#;
        let (base_url, shutdown_tx) = start_mock_server(413, body).await;
        let dir = tempfile::tempdir().unwrap();

        let client = OpenAiTranscriber::new("test-key", Some(base_url), "whisper-1", "sl");
        let err = client.transcribe(&write_chunk(&dir)).await.unwrap_err();

        match err {
            TranscribeError::Api { status, body } => {
                assert_eq!(status.as_u16(), 413);
                assert!(body.contains("file too large"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        shutdown_tx.send(()).ok();
    }

    #[tokio::test]
    async fn test_missing_chunk_file_is_read_error() {
        let client = OpenAiTranscriber::new("test-key", None, "whisper-1", "sl");
        let err = client
            .transcribe(Path::new("does_not_exist.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::ReadChunk { .. }));
    }
}
