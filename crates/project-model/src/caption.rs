//! Caption timeline entries.

use serde::{Deserialize, Serialize};

/// One caption: a clip's text shown over the clip's narration window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (exclusive).
    pub end: f64,
}

impl CaptionEntry {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether two entries share any instant.
    pub fn overlaps(&self, other: &CaptionEntry) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Whether entries, taken in order, never overlap: for all `i < j`,
/// `entries[i].end <= entries[j].start`.
pub fn captions_are_disjoint(entries: &[CaptionEntry]) -> bool {
    let mut latest_end = f64::NEG_INFINITY;
    for entry in entries {
        if entry.start < latest_end {
            return false;
        }
        latest_end = latest_end.max(entry.end);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_entries_do_not_overlap() {
        let a = CaptionEntry::new("Second clip", 5.0, 8.0);
        let b = CaptionEntry::new("Done", 8.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(captions_are_disjoint(&[a, b]));
    }

    #[test]
    fn test_overlap_detected() {
        let a = CaptionEntry::new("one", 0.0, 3.0);
        let b = CaptionEntry::new("two", 2.5, 4.0);
        assert!(a.overlaps(&b));
        assert!(!captions_are_disjoint(&[a, b]));
    }
}
