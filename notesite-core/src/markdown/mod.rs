//! Markdown processing pipeline.
//!
//! Parsing is done by pulldown-cmark with the extensions switched on under
//! `plugins.mdEnhance`. The event stream is then rewritten in a few passes:
//! heading ids and anchors, internal link rewriting, and syntax highlighting.

pub mod highlight;

use crate::models::{is_external, link_key, with_base, PageHeader};
use crate::slug::SlugDeduper;
use crate::theme::MdEnhanceConfig;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

pub use highlight::HighlightTransformer;

/// A heading found in a document, with its final anchor id
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub id: String,
}

/// Where a document lives, used to resolve its relative links
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    /// Directory of the source file as a route, e.g. `/react/`
    pub current_dir: &'a str,
    /// Site base path
    pub base: &'a str,
    /// Deepest heading level (below h1) kept in the outline
    pub header_depth: u8,
    /// Link key to page route
    pub routes: &'a HashMap<String, String>,
}

/// Output of [`MarkdownProcessor::convert`]
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    /// Every heading in document order
    pub headings: Vec<Heading>,
    /// Nested outline limited to `header_depth`
    pub headers: Vec<PageHeader>,
    /// Link keys of internal page links, deduplicated, in order of appearance
    pub links: Vec<String>,
    /// Text content, used for word counts
    pub plain_text: String,
    pub first_h1: Option<String>,
}

/// Markdown processor configured from `mdEnhance`
pub struct MarkdownProcessor {
    options: Options,
    highlighter: HighlightTransformer,
}

impl MarkdownProcessor {
    pub fn new(enhance: &MdEnhanceConfig) -> Self {
        let mut options = Options::empty();
        if enhance.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_GFM);
        }
        if enhance.tasklist {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if enhance.footnote {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if enhance.sup {
            options.insert(Options::ENABLE_SUPERSCRIPT);
        }
        if enhance.sub {
            options.insert(Options::ENABLE_SUBSCRIPT);
        }
        if enhance.deflist {
            options.insert(Options::ENABLE_DEFINITION_LIST);
        }
        if enhance.heading_attrs {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }

        Self {
            options,
            highlighter: HighlightTransformer::new(),
        }
    }

    /// Convert markdown to HTML, collecting headings, links and text
    pub fn convert(&self, markdown: &str, ctx: &LinkContext<'_>) -> Rendered {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();

        let headings = collect_headings(&events);
        let plain_text = collect_text(&events);

        let events = attach_heading_ids(events, &headings);
        let events = add_heading_anchors(events);
        let (events, links) = rewrite_links(events, ctx);
        let events = self.highlighter.transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        let first_h1 = headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.title.clone());
        let headers = build_outline(&headings, ctx.header_depth);

        Rendered {
            html: html_output,
            headings,
            headers,
            links,
            plain_text,
            first_h1,
        }
    }

    /// Convert markdown to HTML without any link context
    pub fn convert_simple(&self, markdown: &str) -> String {
        let routes = HashMap::new();
        let ctx = LinkContext {
            current_dir: "/",
            base: "/",
            header_depth: 2,
            routes: &routes,
        };
        self.convert(markdown, &ctx).html
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new(&MdEnhanceConfig::default())
    }
}

fn heading_level(level: HeadingLevel) -> u32 {
    level as u32
}

fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut deduper = SlugDeduper::new();
    for event in events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            deduper.reserve(id);
        }
    }

    let mut headings = Vec::new();
    let mut current: Option<(u32, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                let explicit = id.as_ref().map(|s| s.to_string());
                current = Some((heading_level(*level), explicit, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, title)) = current.take() {
                    let title = title.trim().to_string();
                    let id = explicit.unwrap_or_else(|| deduper.unique(&title));
                    headings.push(Heading { level, title, id });
                }
            }
            _ => {}
        }
    }

    headings
}

fn collect_text(events: &[Event]) -> String {
    let mut text = String::new();

    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableCell
                | TagEnd::BlockQuote(_),
            ) => text.push('\n'),
            _ => {}
        }
    }

    text
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, headings: &[Heading]) -> Vec<Event<'a>> {
    let mut heading_iter = headings.iter();

    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let id = match heading_iter.next() {
                    Some(next) => Some(CowStr::Boxed(next.id.clone().into_boxed_str())),
                    None => id,
                };
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                })
            }
            other => other,
        })
        .collect()
}

fn add_heading_anchors(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut result = Vec::with_capacity(events.len());
    let mut current_id: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { ref id, .. }) => {
                current_id = id.as_ref().map(|s| s.to_string());
                result.push(event);
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(id) = current_id.take() {
                    let anchor = format!(
                        "<a class=\"header-anchor\" href=\"#{}\" aria-hidden=\"true\">#</a>",
                        html_escape(&id)
                    );
                    result.push(Event::InlineHtml(CowStr::Boxed(anchor.into_boxed_str())));
                }
                result.push(Event::End(TagEnd::Heading(level)));
            }
            other => result.push(other),
        }
    }

    result
}

/// Point internal links at page routes and collect their link keys
fn rewrite_links<'a>(events: Vec<Event<'a>>, ctx: &LinkContext<'_>) -> (Vec<Event<'a>>, Vec<String>) {
    let mut links: Vec<String> = Vec::new();

    let events = events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = match rewrite_target(&dest_url, ctx, &mut links) {
                    Some(href) => CowStr::Boxed(href.into_boxed_str()),
                    None => dest_url,
                };
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                let dest_url = if dest_url.starts_with('/') && !dest_url.starts_with("//") {
                    CowStr::Boxed(with_base(ctx.base, &dest_url).into_boxed_str())
                } else {
                    dest_url
                };
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                })
            }
            other => other,
        })
        .collect();

    (events, links)
}

fn rewrite_target(dest: &str, ctx: &LinkContext<'_>, links: &mut Vec<String>) -> Option<String> {
    if dest.is_empty() || dest.starts_with('#') || dest.starts_with("//") || is_external(dest) {
        return None;
    }

    let split = dest.find(['#', '?']).unwrap_or(dest.len());
    let (path, suffix) = dest.split_at(split);
    if path.is_empty() {
        return None;
    }

    let absolute = if path.starts_with('/') {
        path.to_string()
    } else {
        join_relative(ctx.current_dir, path)
    };

    if !is_page_path(&absolute) {
        return Some(format!("{}{}", with_base(ctx.base, &absolute), suffix));
    }

    let key = link_key(&absolute);
    if !links.contains(&key) {
        links.push(key.clone());
    }

    let target = ctx.routes.get(&key).map(String::as_str).unwrap_or(&absolute);
    Some(format!("{}{}", with_base(ctx.base, target), suffix))
}

/// Directory routes, extensionless paths and `.md`/`.html` files name pages
fn is_page_path(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    last.is_empty() || !last.contains('.') || last.ends_with(".md") || last.ends_with(".html")
}

/// Resolve `link` against the route directory `dir`, folding `.` and `..`
pub fn join_relative(dir: &str, link: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();

    for part in link.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut joined = format!("/{}", segments.join("/"));
    if link.ends_with('/') && !joined.ends_with('/') {
        joined.push('/');
    }
    joined
}

/// Nest headings into an outline of levels 2 through `depth + 1`.
///
/// Each heading goes under the closest preceding heading of a lower
/// level; headings with no such parent stay at the top.
fn build_outline(headings: &[Heading], depth: u8) -> Vec<PageHeader> {
    let max_level = 1 + u32::from(depth.min(5));
    let mut roots: Vec<PageHeader> = Vec::new();

    for heading in headings.iter().filter(|h| h.level >= 2 && h.level <= max_level) {
        let header = PageHeader {
            level: heading.level,
            title: heading.title.clone(),
            slug: heading.id.clone(),
            children: Vec::new(),
        };
        insert_header(&mut roots, header);
    }

    roots
}

fn insert_header(siblings: &mut Vec<PageHeader>, header: PageHeader) {
    match siblings.last_mut() {
        Some(last) if last.level < header.level => insert_header(&mut last.children, header),
        _ => siblings.push(header),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> HashMap<String, String> {
        let mut routes = HashMap::new();
        routes.insert("/react/".to_string(), "/react/".to_string());
        routes.insert("/react/react".to_string(), "/react/react.html".to_string());
        routes.insert("/react/hooks".to_string(), "/react/hooks.html".to_string());
        routes.insert("/regexp/boundary".to_string(), "/regexp/boundary.html".to_string());
        routes
    }

    fn convert(md: &str, dir: &str, base: &str) -> Rendered {
        let routes = routes();
        let ctx = LinkContext {
            current_dir: dir,
            base,
            header_depth: 2,
            routes: &routes,
        };
        MarkdownProcessor::default().convert(md, &ctx)
    }

    #[test]
    fn test_basic_markdown() {
        let processor = MarkdownProcessor::default();
        let html = processor.convert_simple("# Hello World\n\nThis is a **test**.");
        assert!(html.contains("<h1 id=\"hello-world\">"));
        assert!(html.contains("<strong>test</strong>"));
        assert!(html.contains("href=\"#hello-world\""));
    }

    #[test]
    fn test_rendered_html_snapshot() {
        let rendered = convert("## Setup\n\nText with [a link](hooks.md).\n", "/react/", "/");
        insta::assert_snapshot!(rendered.html, @r##"
        <h2 id="setup">Setup<a class="header-anchor" href="#setup" aria-hidden="true">#</a></h2>
        <p>Text with <a href="/react/hooks.html">a link</a>.</p>
        "##);
    }

    #[test]
    fn test_tables_follow_gfm_switch() {
        let md = "| A | B |\n|---|---|\n| 1 | 2 |\n";
        assert!(MarkdownProcessor::default().convert_simple(md).contains("<table>"));

        let plain = MdEnhanceConfig {
            gfm: false,
            ..MdEnhanceConfig::default()
        };
        assert!(!MarkdownProcessor::new(&plain).convert_simple(md).contains("<table>"));
    }

    #[test]
    fn test_optional_extensions() {
        let md = "- [x] done\n\nNote[^1]\n\n[^1]: The footnote.\n";
        let off = MarkdownProcessor::default().convert_simple(md);
        assert!(!off.contains("checkbox"));

        let enhance = MdEnhanceConfig {
            tasklist: true,
            footnote: true,
            ..MdEnhanceConfig::default()
        };
        let on = MarkdownProcessor::new(&enhance).convert_simple(md);
        assert!(on.contains("checkbox"));
        assert!(on.contains("footnote"));
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let rendered = convert("## Setup\n\n## Setup\n\n## 正则 表达式\n", "/", "/");
        let ids: Vec<_> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "正则-表达式"]);
        assert!(rendered.html.contains("id=\"setup-1\""));
    }

    #[test]
    fn test_explicit_heading_id() {
        let enhance = MdEnhanceConfig {
            heading_attrs: true,
            ..MdEnhanceConfig::default()
        };
        let routes = HashMap::new();
        let ctx = LinkContext {
            current_dir: "/",
            base: "/",
            header_depth: 2,
            routes: &routes,
        };
        let rendered = MarkdownProcessor::new(&enhance).convert("## Intro {#start}\n", &ctx);
        assert_eq!(rendered.headings[0].id, "start");
        assert_eq!(rendered.headings[0].title, "Intro");

        let rendered = MarkdownProcessor::new(&enhance)
            .convert("## Setup\n\n## Install {#setup}\n", &ctx);
        let ids: Vec<_> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup-1", "setup"]);
    }

    #[test]
    fn test_outline_nesting() {
        let md = "# Title\n\n### Orphan\n\n## One\n\n### One A\n\n#### Too deep\n\n### One B\n\n## Two\n";
        let rendered = convert(md, "/", "/");
        assert_eq!(rendered.first_h1.as_deref(), Some("Title"));

        let outline = &rendered.headers;
        assert_eq!(outline.len(), 3);
        assert_eq!(outline[0].title, "Orphan");
        assert_eq!(outline[1].title, "One");
        assert_eq!(outline[1].children.len(), 2);
        assert_eq!(outline[1].children[1].slug, "one-b");
        assert!(outline[1].children[0].children.is_empty());
        assert_eq!(outline[2].title, "Two");
    }

    #[test]
    fn test_outline_depth() {
        let md = "## A\n\n### B\n\n#### C\n";
        let routes = HashMap::new();
        let ctx = LinkContext {
            current_dir: "/",
            base: "/",
            header_depth: 3,
            routes: &routes,
        };
        let rendered = MarkdownProcessor::default().convert(md, &ctx);
        assert_eq!(rendered.headers[0].children[0].children[0].title, "C");
    }

    #[test]
    fn test_relative_links_are_rewritten() {
        let md = "[Hooks](./hooks.md#state) and [Home](README.md) and [Regex](../regexp/boundary.md)";
        let rendered = convert(md, "/react/", "/notes/");
        assert!(rendered.html.contains("href=\"/notes/react/hooks.html#state\""));
        assert!(rendered.html.contains("href=\"/notes/react/\""));
        assert!(rendered.html.contains("href=\"/notes/regexp/boundary.html\""));
        assert_eq!(
            rendered.links,
            vec!["/react/hooks", "/react/", "/regexp/boundary"]
        );
    }

    #[test]
    fn test_unresolved_and_external_links() {
        let md = "[Gone](/vue/intro.md) [Site](https://vuejs.org) [Top](#top) [Img](/logo.png)";
        let rendered = convert(md, "/", "/");
        assert_eq!(rendered.links, vec!["/vue/intro"]);
        assert!(rendered.html.contains("href=\"https://vuejs.org\""));
        assert!(rendered.html.contains("href=\"#top\""));
        assert!(rendered.html.contains("href=\"/logo.png\""));
    }

    #[test]
    fn test_plain_text() {
        let rendered = convert("# Title\n\nSome `code` here.\n", "/", "/");
        assert_eq!(rendered.plain_text.split_whitespace().count(), 4);
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("/react/", "hooks.md"), "/react/hooks.md");
        assert_eq!(join_relative("/react/", "../vue/"), "/vue/");
        assert_eq!(join_relative("/", "../../a.md"), "/a.md");
        assert_eq!(join_relative("/a/b/", "./c/d.md"), "/a/b/c/d.md");
    }
}
