//! Regrouping a global word sequence into fixed-width time intervals.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use super::{Word, format_mmss};

/// One fixed-width window of the global timeline with the words that fall
/// inside it. Derived on demand from merged words, never persisted itself.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBucket {
    /// Human-readable `MM:SS-MM:SS` range
    pub label: String,
    /// Window start in whole seconds
    pub start_time: u64,
    /// Window end in whole seconds
    pub end_time: u64,
    /// Space-joined word texts, trimmed
    pub text: String,
    /// Words inside the window, in start order
    pub words: Vec<Word>,
}

/// Bucket words into fixed `interval_minutes`-wide windows.
///
/// Words are sorted by start time first: merge order alone does not
/// guarantee strict global ordering when a silent chunk under-offsets its
/// successors. Empty intervals produce no bucket. Output is sorted by
/// start time ascending.
pub fn regroup(words: &[Word], interval_minutes: u32) -> Vec<IntervalBucket> {
    let interval_secs = u64::from(interval_minutes) * 60;
    if interval_secs == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<Word> = words.to_vec();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut buckets: BTreeMap<u64, Vec<Word>> = BTreeMap::new();
    for word in sorted {
        let index = (word.start / interval_secs as f64).floor() as u64;
        buckets.entry(index).or_default().push(word);
    }

    buckets
        .into_iter()
        .map(|(index, words)| {
            let start_time = index * interval_secs;
            let end_time = start_time + interval_secs;
            let text = words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();

            IntervalBucket {
                label: format!("{}-{}", format_mmss(start_time), format_mmss(end_time)),
                start_time,
                end_time,
                text,
                words,
            }
        })
        .collect()
}

/// Render buckets as the interval report: a duration header, then one
/// `[MM:SS-MM:SS]` section per bucket separated by rule lines.
pub fn render_interval_report(buckets: &[IntervalBucket], total_duration_secs: f64) -> String {
    let rule = "-".repeat(80);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Total duration: {:.2} seconds ({:.1} minutes)",
        total_duration_secs,
        total_duration_secs / 60.0
    );
    let _ = writeln!(out, "Number of intervals: {}", buckets.len());
    let _ = writeln!(out, "{rule}");

    for bucket in buckets {
        let _ = writeln!(out, "\n[{}]", bucket.label);
        let _ = writeln!(out, "{}", bucket.text);
        let _ = writeln!(out, "{rule}");
    }

    out
}
