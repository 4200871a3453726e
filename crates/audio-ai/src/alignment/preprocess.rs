//! Script normalization shared by every alignment tier.

/// Collapse runs of whitespace and make sure the script ends with
/// terminal punctuation (`.`, `!` or `?`).
pub fn preprocess_script(script: &str) -> String {
    let mut text = script.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() && !text.ends_with(&['.', '!', '?'][..]) {
        text.push('.');
    }
    text
}

/// Words of a preprocessed script, in order.
pub fn script_words(script: &str) -> Vec<&str> {
    script.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            preprocess_script("  Hello\n\tworld.  Second   clip! "),
            "Hello world. Second clip!"
        );
    }

    #[test]
    fn test_terminal_punctuation_appended() {
        assert_eq!(preprocess_script("Hello world"), "Hello world.");
        assert_eq!(preprocess_script("Really?"), "Really?");
        assert_eq!(preprocess_script("Done,"), "Done,.");
    }

    #[test]
    fn test_blank_script_stays_empty() {
        assert_eq!(preprocess_script(" \n "), "");
        assert!(script_words("").is_empty());
    }
}
