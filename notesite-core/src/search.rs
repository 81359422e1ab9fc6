//! Section-level search index.
//!
//! Every page is split at its headings; each section becomes one
//! [`SearchEntry`] so results can link straight to the matching anchor.

use crate::models::Page;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// `route` or `route#anchor`
    pub id: String,
    /// Link with the site base applied
    pub url: String,
    pub title: String,
    /// Heading of the section, empty for text before the first heading
    pub section_title: String,
    pub content: String,
    pub snippet: String,
    pub tags: Vec<String>,
}

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static ID_ATTR_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"(?s)<h[1-6]\b([^>]*)>(.*?)</h[1-6]>").unwrap())
}

fn id_attr_re() -> &'static Regex {
    ID_ATTR_RE.get_or_init(|| Regex::new(r#"\bid="([^"]*)""#).unwrap())
}

/// Build the search entries for one page
pub fn build_search_index(page: &Page, base: &str) -> Vec<SearchEntry> {
    let page_url = page.url_with_base(base);
    let sections = extract_sections(&page.content_html);

    if sections.is_empty() {
        let content = html_to_text(&page.content_html);
        return vec![SearchEntry {
            id: page.route.clone(),
            url: page_url,
            title: page.title.clone(),
            section_title: String::new(),
            snippet: create_snippet(&content, SNIPPET_CHARS),
            content,
            tags: page.tags.clone(),
        }];
    }

    sections
        .into_iter()
        .map(|section| {
            let (id, url) = if section.anchor.is_empty() {
                (page.route.clone(), page_url.clone())
            } else {
                (
                    format!("{}#{}", page.route, section.anchor),
                    format!("{}#{}", page_url, section.anchor),
                )
            };

            SearchEntry {
                id,
                url,
                title: page.title.clone(),
                section_title: section.heading,
                snippet: create_snippet(&section.text, SNIPPET_CHARS),
                content: section.text,
                tags: page.tags.clone(),
            }
        })
        .collect()
}

#[derive(Debug)]
struct Section {
    heading: String,
    anchor: String,
    text: String,
}

fn extract_sections(html: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut cursor = 0;
    let mut current = Section {
        heading: String::new(),
        anchor: String::new(),
        text: String::new(),
    };

    for caps in heading_re().captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };

        current.text = html_to_text(&html[cursor..whole.start()]);
        let finished = std::mem::replace(
            &mut current,
            Section {
                heading: heading_text(caps.get(2).map(|m| m.as_str()).unwrap_or("")),
                anchor: caps
                    .get(1)
                    .and_then(|attrs| id_attr_re().captures(attrs.as_str()))
                    .and_then(|id| id.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                text: String::new(),
            },
        );
        if !finished.heading.is_empty() || !finished.text.is_empty() {
            sections.push(finished);
        }

        cursor = whole.end();
    }

    if sections.is_empty() && current.heading.is_empty() {
        // No headings at all
        return Vec::new();
    }

    current.text = html_to_text(&html[cursor..]);
    sections.push(current);
    sections
}

/// Heading text without the trailing anchor marker
fn heading_text(inner_html: &str) -> String {
    html_to_text(inner_html).trim_end_matches('#').trim_end().to_string()
}

fn html_to_text(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for ch in html.chars() {
        match ch {
            '<' => {
                in_tag = true;
                result.push(' ');
            }
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn create_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

/// Rank entries against a query.
///
/// Every whitespace-separated term must match somewhere in the entry. Title
/// hits outrank section-title hits, which outrank tag and body hits.
pub fn perform_search<'a>(
    entries: &'a [SearchEntry],
    query: &str,
    limit: usize,
) -> Vec<(&'a SearchEntry, f32)> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<(&SearchEntry, f32)> = entries
        .iter()
        .filter_map(|entry| {
            let title = entry.title.to_lowercase();
            let section = entry.section_title.to_lowercase();
            let content = entry.content.to_lowercase();
            let tags: Vec<String> = entry.tags.iter().map(|t| t.to_lowercase()).collect();

            let mut score = 0.0;
            for term in &terms {
                let mut term_score = 0.0;
                if title.contains(term.as_str()) {
                    term_score += 10.0;
                }
                if section.contains(term.as_str()) {
                    term_score += 5.0;
                }
                if tags.iter().any(|t| t.contains(term.as_str())) {
                    term_score += 3.0;
                }
                if content.contains(term.as_str()) {
                    term_score += 1.0;
                }
                if term_score == 0.0 {
                    return None;
                }
                score += term_score;
            }
            Some((entry, score))
        })
        .collect();

    results.sort_by(|a, b| b.1.total_cmp(&a.1));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frontmatter;

    fn page(route: &str, title: &str, html: &str) -> Page {
        Page {
            route: route.into(),
            source_path: String::new(),
            title: title.into(),
            lang: "en-US".into(),
            frontmatter: Frontmatter::default(),
            content_html: html.into(),
            headers: vec![],
            word_count: 0,
            reading_time: 0,
            date: None,
            tags: vec!["regexp".into()],
            categories: vec![],
            outgoing_links: vec![],
            raw_body: None,
        }
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<p>Hello <strong>world</strong> &amp; <code>\\b</code></p>");
        assert_eq!(text, "Hello world & \\b");
    }

    #[test]
    fn test_create_snippet() {
        let text = "This is a long piece of text that should be truncated at a word boundary";
        let snippet = create_snippet(text, 30);
        assert_eq!(snippet, "This is a long piece of text...");
    }

    #[test]
    fn test_sections_split_at_headings() {
        let html = r##"<p>Intro text</p><hr /><h2 id="anchors">Anchors<a class="header-anchor" href="#anchors" aria-hidden="true">#</a></h2><p>Match \b</p><h2 id="groups">Groups<a class="header-anchor" href="#groups" aria-hidden="true">#</a></h2><p>Capture</p>"##;
        let entries = build_search_index(&page("/regexp/boundary.html", "Boundaries", html), "/notes/");

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, "/regexp/boundary.html");
        assert_eq!(entries[0].content, "Intro text");
        assert_eq!(entries[1].section_title, "Anchors");
        assert_eq!(entries[1].url, "/notes/regexp/boundary.html#anchors");
        assert_eq!(entries[1].content, "Match \\b");
        assert_eq!(entries[2].id, "/regexp/boundary.html#groups");
        assert_eq!(entries[2].tags, vec!["regexp"]);
    }

    #[test]
    fn test_page_without_headings() {
        let entries = build_search_index(&page("/", "Home", "<p>Welcome</p>"), "/");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "/");
        assert_eq!(entries[0].section_title, "");
    }

    #[test]
    fn test_search_ranking() {
        let entries = vec![
            SearchEntry {
                id: "/a.html".into(),
                url: "/a.html".into(),
                title: "Hooks".into(),
                section_title: String::new(),
                content: "State in function components".into(),
                snippet: String::new(),
                tags: vec![],
            },
            SearchEntry {
                id: "/b.html#hooks".into(),
                url: "/b.html#hooks".into(),
                title: "React".into(),
                section_title: "Hooks".into(),
                content: "Rules".into(),
                snippet: String::new(),
                tags: vec![],
            },
            SearchEntry {
                id: "/c.html".into(),
                url: "/c.html".into(),
                title: "Vue".into(),
                section_title: String::new(),
                content: "Composition API is like hooks".into(),
                snippet: String::new(),
                tags: vec![],
            },
        ];

        let ids: Vec<_> = perform_search(&entries, "HOOKS", 10)
            .iter()
            .map(|(e, _)| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["/a.html", "/b.html#hooks", "/c.html"]);

        assert_eq!(perform_search(&entries, "hooks state", 10).len(), 1);
        assert_eq!(perform_search(&entries, "hooks", 2).len(), 2);
        assert!(perform_search(&entries, "   ", 10).is_empty());
    }
}
