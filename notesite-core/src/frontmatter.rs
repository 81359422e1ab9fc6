//! Frontmatter parsing from markdown files.

use crate::models::Frontmatter;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Unterminated frontmatter block")]
    Unterminated,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^\u{feff}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n(.*))?$").unwrap()
    })
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body).
/// If no frontmatter is present, returns default frontmatter with the full content as body.
///
/// # Example
///
/// ```
/// use notesite_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: React\ntag: [react, hooks]\n---\n# Hello\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("React"));
/// assert_eq!(fm.tag.to_vec(), vec!["react", "hooks"]);
/// assert!(body.trim().starts_with("# Hello"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let re = frontmatter_regex();

    if let Some(captures) = re.captures(content) {
        let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or("");
        let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

        let frontmatter: Frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        Ok((frontmatter, body.to_string()))
    } else if opens_block(content) {
        Err(FrontmatterError::Unterminated)
    } else {
        // No frontmatter, return default with full content as body
        Ok((Frontmatter::default(), content.to_string()))
    }
}

/// First line is a `---` fence, with either line ending
fn opens_block(content: &str) -> bool {
    content
        .trim_start_matches('\u{feff}')
        .split_once('\n')
        .is_some_and(|(line, _)| line.trim_end() == "---")
}

/// Parse the date forms authors actually write: `2023-04-01`,
/// `2023-04-01 10:30`, `2023-04-01T10:30:00Z`, `2023/04/01`, and a bare
/// year (`2023`, read as January 1st).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    let head: String = raw.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&head, "%Y/%m/%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Word Boundaries
icon: regexp
description: How \b matches
date: 2022-03-14
category: regexp
tag:
  - javascript
  - regexp
---

# Word Boundaries

Body text."#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Word Boundaries"));
        assert_eq!(fm.icon.as_deref(), Some("regexp"));
        assert_eq!(fm.description.as_deref(), Some("How \\b matches"));
        assert_eq!(fm.date.as_deref(), Some("2022-03-14"));
        assert_eq!(fm.category.to_vec(), vec!["regexp"]);
        assert_eq!(fm.tag.to_vec(), vec!["javascript", "regexp"]);
        assert!(body.contains("# Word Boundaries"));
        assert!(body.contains("Body text."));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_title_is_optional() {
        let (fm, body) = parse_frontmatter("---\ndescription: untitled\n---\nText\n").unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(body, "Text\n");
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = parse_frontmatter("---\n---\nBody\n").unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_frontmatter_only() {
        let (fm, body) = parse_frontmatter("---\ntitle: Stub\n---").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Stub"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let (fm, body) = parse_frontmatter("---\r\ntitle: Windows\r\n---\r\nBody\r\n").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_flags() {
        let content = "---\ntitle: Draft\ndraft: true\narticle: false\nstar: true\norder: 3\npermalink: /custom/\n---\n";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert!(fm.draft);
        assert_eq!(fm.article, Some(false));
        assert!(fm.star);
        assert_eq!(fm.order, Some(3));
        assert_eq!(fm.permalink.as_deref(), Some("/custom/"));
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\ntag: [unclosed\n---\n\nContent.";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::YamlError(_))
        ));
    }

    #[test]
    fn test_unterminated() {
        let content = "---\ntitle: Test\n\nNo closing fence";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_unterminated_crlf() {
        let content = "---\r\ntitle: Test\r\n\r\nNo closing fence";
        assert!(matches!(
            parse_frontmatter(content),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_numeric_scalars() {
        let content = "---\ntitle: 1984\ndate: 2022\ntag: [es6, 2022]\ncategory: 7\n---\nBody\n";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
        assert_eq!(fm.date.as_deref(), Some("2022"));
        assert_eq!(fm.tag.to_vec(), vec!["es6", "2022"]);
        assert_eq!(fm.category.to_vec(), vec!["7"]);
        assert_eq!(parse_date("2022"), NaiveDate::from_ymd_opt(2022, 1, 1));
    }

    #[test]
    fn test_parse_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 4, 1);
        assert_eq!(parse_date("2023-04-01"), expected);
        assert_eq!(parse_date("2023-04-01 10:30"), expected);
        assert_eq!(parse_date("2023-04-01T10:30:00Z"), expected);
        assert_eq!(parse_date("2023/04/01"), expected);
        assert_eq!(parse_date("April 1st"), None);
    }
}
