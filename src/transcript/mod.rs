//! Transcript types shared across the pipeline.
//!
//! Word timings are chunk-local when they come back from the transcription
//! API and global after merging; the types are the same, only the timeline
//! they refer to changes.

pub mod intervals;
pub mod merge;

pub use intervals::{IntervalBucket, regroup, render_interval_report};
pub use merge::{MergedTranscript, SilentChunkPolicy, merge_chunks};

use serde::{Deserialize, Serialize};

/// A single recognized word with timing information.
///
/// The API reports the text under either `word` or `text` depending on the
/// response variant; both deserialize into `text` here so nothing downstream
/// has to care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// The recognized text
    #[serde(alias = "word")]
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Word {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Transcription result for one chunk, on the chunk's local timeline.
///
/// This is exactly what gets checkpointed to the progress file, so both
/// fields tolerate being absent in older or partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Full transcribed text of the chunk
    #[serde(default)]
    pub text: String,
    /// Word-level timings, chunk-local
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Format a whole-second offset as `MM:SS`.
///
/// Minutes are total minutes and run past 59 for long recordings.
pub fn format_mmss(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmss_format() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(59), "00:59");
        assert_eq!(format_mmss(60), "01:00");
        assert_eq!(format_mmss(3661), "61:01");
    }

    #[test]
    fn test_word_accepts_word_key() {
        let w: Word = serde_json::from_str(r#"{"word": "hello", "start": 0.5, "end": 1.0}"#)
            .expect("word-keyed entry should deserialize");
        assert_eq!(w.text, "hello");
        assert_eq!(w.start, 0.5);
    }

    #[test]
    fn test_word_accepts_text_key() {
        let w: Word = serde_json::from_str(r#"{"text": "hello", "start": 0.5, "end": 1.0}"#)
            .expect("text-keyed entry should deserialize");
        assert_eq!(w.text, "hello");
    }

    #[test]
    fn test_chunk_result_tolerates_missing_fields() {
        let r: ChunkResult = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
        assert!(r.words.is_empty());

        let r: ChunkResult = serde_json::from_str("{}").unwrap();
        assert!(r.text.is_empty());
    }
}
