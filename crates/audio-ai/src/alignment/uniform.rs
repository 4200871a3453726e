//! Uniform estimation: the tier that cannot fail.

use voxreel_project_model::word::Word;

/// Spread `words` evenly over the audio.
///
/// The total span is `audio_duration` when known and positive, otherwise
/// `fallback_word_secs` per word. Windows are contiguous and the last word
/// ends exactly at the total span.
pub fn uniform_words(words: &[&str], audio_duration: Option<f64>, fallback_word_secs: f64) -> Vec<Word> {
    if words.is_empty() {
        return vec![];
    }

    let n = words.len();
    let total = audio_duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(fallback_word_secs * n as f64);
    let step = total / n as f64;

    words
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let start = i as f64 * step;
            let end = if i + 1 == n {
                total
            } else {
                (i + 1) as f64 * step
            };
            Word::new(*text, start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use voxreel_project_model::word::words_are_monotonic;

    #[test]
    fn test_known_duration_split_evenly() {
        let words = uniform_words(&["Hello", "world."], Some(2.0), 0.5);
        assert_eq!(words[0], Word::new("Hello", 0.0, 1.0));
        assert_eq!(words[1], Word::new("world.", 1.0, 2.0));
    }

    #[test]
    fn test_unknown_duration_uses_fallback_per_word() {
        let words = uniform_words(&["a", "b", "c", "d"], None, 0.5);
        assert_eq!(words.last().unwrap().end, 2.0);
    }

    #[test]
    fn test_non_positive_duration_treated_as_unknown() {
        let words = uniform_words(&["a", "b"], Some(0.0), 0.5);
        assert_eq!(words.last().unwrap().end, 1.0);
    }

    proptest! {
        #[test]
        fn last_word_ends_at_duration(n in 1usize..200, duration in 0.1f64..3600.0) {
            let texts: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let words = uniform_words(&refs, Some(duration), 0.5);

            prop_assert_eq!(words.len(), n);
            prop_assert_eq!(words[0].start, 0.0);
            prop_assert_eq!(words[n - 1].end, duration);
            prop_assert!(words_are_monotonic(&words));
            for pair in words.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }
}
