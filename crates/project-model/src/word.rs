//! Word-level timing produced by the alignment resolver.

use serde::{Deserialize, Serialize};

/// A single aligned word.
///
/// Word sequences are ordered by script position and treated as immutable
/// once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text as it appears in the script.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
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

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Time span `[first.start, last.end)` covered by a word sequence.
pub fn words_span(words: &[Word]) -> Option<(f64, f64)> {
    let first = words.first()?;
    let last = words.last()?;
    Some((first.start, last.end))
}

/// Whether every word window is well-formed and ordered after its predecessor.
pub fn words_are_monotonic(words: &[Word]) -> bool {
    words.iter().all(|w| w.end >= w.start)
        && words.windows(2).all(|pair| pair[1].start >= pair[0].start)
}
