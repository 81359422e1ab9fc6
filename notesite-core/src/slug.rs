//! Slug generation for heading anchors, tag and category routes.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();

fn hyphen_run() -> &'static Regex {
    HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a string to a URL-safe slug
///
/// Lowercases, turns whitespace and underscores into hyphens, drops
/// punctuation and keeps any alphabetic character (so CJK headings
/// still produce usable anchors).
///
/// # Examples
///
/// ```
/// use notesite_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("React & Hooks"), "react-hooks");
/// assert_eq!(slugify("C++ Notes"), "c-notes");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_whitespace() || c == '_' || c == '-' {
                Some("-")
            } else if c.is_alphanumeric() {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    hyphen_run()
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}

/// Hands out slugs that are unique within one document.
///
/// Repeated headings get a numeric suffix: `setup`, `setup-1`, `setup-2`.
/// Ids registered with [`SlugDeduper::reserve`] are never handed out.
#[derive(Debug, Default)]
pub struct SlugDeduper {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SlugDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an explicit id as used
    pub fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    pub fn unique(&mut self, text: &str) -> String {
        self.unique_or(text, "section")
    }

    /// Like [`SlugDeduper::unique`], using `fallback` when `text` has no
    /// sluggable characters
    pub fn unique_or(&mut self, text: &str, fallback: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = fallback.to_string();
        }

        if self.taken.insert(base.clone()) {
            return base;
        }

        let suffix = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{}-{}", base, suffix);
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Regular Expressions"), "regular-expressions");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("React & Hooks"), "react-hooks");
        assert_eq!(slugify("Node.js Tips"), "nodejs-tips");
        assert_eq!(slugify("What's \\b?"), "whats-b");
    }

    #[test]
    fn test_cjk_is_kept() {
        assert_eq!(slugify("正则 表达式"), "正则-表达式");
    }

    #[test]
    fn test_whitespace_and_underscores() {
        assert_eq!(slugify("  Hello    World  "), "hello-world");
        assert_eq!(slugify("use_state hook"), "use-state-hook");
        assert_eq!(slugify("-Leading-"), "leading");
    }

    #[test]
    fn test_empty_and_symbols_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_deduper_suffixes_repeats() {
        let mut dedupe = SlugDeduper::new();
        assert_eq!(dedupe.unique("Setup"), "setup");
        assert_eq!(dedupe.unique("Setup"), "setup-1");
        assert_eq!(dedupe.unique("Setup"), "setup-2");
        assert_eq!(dedupe.unique("???"), "section");
    }

    #[test]
    fn test_deduper_avoids_literal_collision() {
        let mut dedupe = SlugDeduper::new();
        assert_eq!(dedupe.unique("a"), "a");
        assert_eq!(dedupe.unique("a"), "a-1");
        assert_eq!(dedupe.unique("a-1"), "a-1-1");
    }

    #[test]
    fn test_deduper_skips_literal_suffix_seen_earlier() {
        let mut dedupe = SlugDeduper::new();
        assert_eq!(dedupe.unique("a-1"), "a-1");
        assert_eq!(dedupe.unique("a"), "a");
        assert_eq!(dedupe.unique("a"), "a-2");
        assert_eq!(dedupe.unique("a"), "a-3");
    }

    #[test]
    fn test_reserved_ids_are_not_reused() {
        let mut dedupe = SlugDeduper::new();
        dedupe.reserve("setup");
        assert_eq!(dedupe.unique("Setup"), "setup-1");
    }

    #[test]
    fn test_custom_fallback() {
        let mut dedupe = SlugDeduper::new();
        assert_eq!(dedupe.unique_or("???", "untitled"), "untitled");
        assert_eq!(dedupe.unique_or("!!!", "untitled"), "untitled-1");
    }
}
