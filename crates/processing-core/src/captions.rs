//! Caption overlap resolution.

use voxreel_project_model::caption::CaptionEntry;

/// Make caption entries pairwise disjoint.
///
/// Entries are ordered by start (stable for equal starts). When an entry
/// starts before its predecessor ends, the predecessor is cut to end
/// `epsilon` seconds before it; a predecessor left with no duration is
/// dropped. Entries that are empty or non-finite on input are discarded.
pub fn resolve_overlaps(entries: Vec<CaptionEntry>, epsilon: f64) -> Vec<CaptionEntry> {
    let mut ordered: Vec<CaptionEntry> = entries
        .into_iter()
        .filter(|e| e.start.is_finite() && e.end.is_finite() && e.end > e.start)
        .collect();
    ordered.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut resolved: Vec<CaptionEntry> = Vec::with_capacity(ordered.len());
    for entry in ordered {
        if let Some(previous) = resolved.last_mut() {
            if previous.end > entry.start {
                let truncated = entry.start - epsilon;
                tracing::debug!(
                    caption = %previous.text,
                    old_end = previous.end,
                    new_end = truncated,
                    "Truncating overlapping caption"
                );
                previous.end = truncated;
                if previous.end <= previous.start {
                    tracing::debug!(caption = %previous.text, "Dropping caption with no remaining time");
                    resolved.pop();
                }
            }
        }
        resolved.push(entry);
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxreel_project_model::caption::captions_are_disjoint;

    #[test]
    fn test_disjoint_entries_untouched() {
        let entries = vec![
            CaptionEntry::new("Hello world", 0.0, 4.0),
            CaptionEntry::new("Second clip", 5.0, 8.0),
            CaptionEntry::new("Done", 8.0, 10.0),
        ];
        let resolved = resolve_overlaps(entries.clone(), 0.01);
        assert_eq!(resolved, entries);
    }

    #[test]
    fn test_overlap_truncates_earlier_entry() {
        let entries = vec![
            CaptionEntry::new("one", 0.0, 3.0),
            CaptionEntry::new("two", 2.5, 4.0),
        ];
        let resolved = resolve_overlaps(entries, 0.01);
        assert_eq!(resolved.len(), 2);
        assert!((resolved[0].end - 2.49).abs() < 1e-9);
        assert!(captions_are_disjoint(&resolved));
    }

    #[test]
    fn test_same_start_drops_earlier_entry() {
        let entries = vec![
            CaptionEntry::new("first", 1.0, 3.0),
            CaptionEntry::new("second", 1.0, 2.0),
        ];
        let resolved = resolve_overlaps(entries, 0.01);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].text, "second");
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let entries = vec![
            CaptionEntry::new("late", 6.0, 7.0),
            CaptionEntry::new("early", 0.0, 2.0),
        ];
        let resolved = resolve_overlaps(entries, 0.01);
        assert_eq!(resolved[0].text, "early");
        assert_eq!(resolved[1].text, "late");
    }

    #[test]
    fn test_degenerate_entries_discarded() {
        let entries = vec![
            CaptionEntry::new("empty", 2.0, 2.0),
            CaptionEntry::new("inverted", 5.0, 4.0),
            CaptionEntry::new("nan", f64::NAN, 1.0),
            CaptionEntry::new("ok", 0.0, 1.0),
        ];
        let resolved = resolve_overlaps(entries, 0.01);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].text, "ok");
    }
}
