//! Word count and reading time.

use unicode_segmentation::UnicodeSegmentation;

/// Words per minute used for reading time
pub const WORDS_PER_MINUTE: usize = 300;

/// Count words in plain text.
///
/// Uses Unicode word segmentation, so Latin text counts whole words while
/// each CJK ideograph counts on its own.
///
/// ```
/// use notesite_core::metrics::word_count;
///
/// assert_eq!(word_count("Hello, world!"), 2);
/// assert_eq!(word_count("学习正则"), 4);
/// ```
pub fn word_count(text: &str) -> usize {
    text.unicode_words().count()
}

/// Minutes needed to read `words`; zero only for empty pages
pub fn reading_time(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_words() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  \n\t "), 0);
        assert_eq!(word_count("Anchors match word boundaries."), 4);
    }

    #[test]
    fn test_mixed_cjk() {
        assert_eq!(word_count("React 是一个库"), 5);
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time(0), 0);
        assert_eq!(reading_time(1), 1);
        assert_eq!(reading_time(300), 1);
        assert_eq!(reading_time(301), 2);
        assert_eq!(reading_time(1200), 4);
    }
}
