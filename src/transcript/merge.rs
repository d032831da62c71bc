//! Merging chunk-local transcriptions onto a single global timeline.

use serde::{Deserialize, Serialize};

use super::{ChunkResult, Word};

/// Complete transcript on the global timeline of the source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedTranscript {
    /// Full transcribed text
    pub text: String,
    /// Word-level timings, re-based onto the global timeline
    pub words: Vec<Word>,
}

/// What the running time offset does when a chunk comes back with no words.
///
/// The reference behavior treats a silent chunk as "no time passed", which
/// under-offsets everything after it. Both choices are available so the
/// caller decides instead of inheriting the ambiguity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SilentChunkPolicy {
    /// Leave the offset unchanged (reference behavior).
    HoldOffset,
    /// Advance the offset by the planned chunk duration.
    Advance { chunk_duration_secs: f64 },
}

/// Merge chunk results, in original split order, into one transcript.
///
/// Texts are joined with single spaces; each chunk's word timestamps get the
/// running offset added, and the offset then advances to the last adjusted
/// word end. Order preservation is a correctness requirement: global
/// timestamps are only monotonic if chunks arrive in split order.
pub fn merge_chunks(chunks: &[ChunkResult], policy: SilentChunkPolicy) -> MergedTranscript {
    let mut merged_text = String::new();
    let mut all_words: Vec<Word> = Vec::new();
    let mut time_offset = 0.0_f64;

    for chunk in chunks {
        merged_text.push_str(&chunk.text);
        merged_text.push(' ');

        for word in &chunk.words {
            all_words.push(Word::new(
                word.text.clone(),
                word.start + time_offset,
                word.end + time_offset,
            ));
        }

        match (chunk.words.last(), policy) {
            (Some(_), _) => {
                // all_words is non-empty here
                time_offset = all_words[all_words.len() - 1].end;
            }
            (None, SilentChunkPolicy::Advance {
                chunk_duration_secs,
            }) => {
                time_offset += chunk_duration_secs;
            }
            (None, SilentChunkPolicy::HoldOffset) => {}
        }
    }

    MergedTranscript {
        text: merged_text.trim_end().to_string(),
        words: all_words,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, words: &[(&str, f64, f64)]) -> ChunkResult {
        ChunkResult {
            text: text.to_string(),
            words: words
                .iter()
                .map(|(t, s, e)| Word::new(*t, *s, *e))
                .collect(),
        }
    }

    #[test]
    fn test_cumulative_offsets_are_order_preserving() {
        // Chunk-local last-word end times 10.0, 20.0, 5.0 must produce
        // offsets 0, 10.0, 30.0 respectively.
        let chunks = vec![
            chunk("one", &[("a", 1.0, 10.0)]),
            chunk("two", &[("b", 2.0, 20.0)]),
            chunk("three", &[("c", 3.0, 5.0)]),
        ];

        let merged = merge_chunks(&chunks, SilentChunkPolicy::HoldOffset);

        assert_eq!(merged.words[0].start, 1.0);
        assert_eq!(merged.words[0].end, 10.0);
        assert_eq!(merged.words[1].start, 12.0);
        assert_eq!(merged.words[1].end, 30.0);
        assert_eq!(merged.words[2].start, 33.0);
        assert_eq!(merged.words[2].end, 35.0);
    }

    #[test]
    fn test_text_joined_and_trimmed() {
        let chunks = vec![chunk("hello", &[]), chunk("world", &[])];
        let merged = merge_chunks(&chunks, SilentChunkPolicy::HoldOffset);
        assert_eq!(merged.text, "hello world");
    }

    #[test]
    fn test_silent_chunk_holds_offset() {
        let chunks = vec![
            chunk("a", &[("a", 0.0, 10.0)]),
            chunk("", &[]),
            chunk("b", &[("b", 1.0, 2.0)]),
        ];

        let merged = merge_chunks(&chunks, SilentChunkPolicy::HoldOffset);
        // Offset stays at 10.0 across the silent chunk.
        assert_eq!(merged.words[1].start, 11.0);
        assert_eq!(merged.words[1].end, 12.0);
    }

    #[test]
    fn test_silent_chunk_advance_policy() {
        let chunks = vec![
            chunk("a", &[("a", 0.0, 10.0)]),
            chunk("", &[]),
            chunk("b", &[("b", 1.0, 2.0)]),
        ];

        let merged = merge_chunks(
            &chunks,
            SilentChunkPolicy::Advance {
                chunk_duration_secs: 15.0,
            },
        );
        // Silent chunk advances the offset by its planned duration.
        assert_eq!(merged.words[1].start, 26.0);
        assert_eq!(merged.words[1].end, 27.0);
    }

    #[test]
    fn test_empty_input() {
        let merged = merge_chunks(&[], SilentChunkPolicy::HoldOffset);
        assert!(merged.text.is_empty());
        assert!(merged.words.is_empty());
    }
}
