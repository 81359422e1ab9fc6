//! Content model: pages, header outlines, diagnostics and the site index.

use crate::navigation::{NavNode, ResolvedSidebar};
use chrono::NaiveDate;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A YAML scalar kept as text: `2022` and `true` read as `"2022"` and `"true"`.
struct ScalarText(String);

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = ScalarText;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ScalarText, E> {
        Ok(ScalarText(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ScalarText, E> {
        Ok(ScalarText(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ScalarText, E> {
        Ok(ScalarText(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<ScalarText, E> {
        Ok(ScalarText(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<ScalarText, E> {
        Ok(ScalarText(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<ScalarText>::deserialize(deserializer)?.map(|text| text.0))
}

/// `tag`/`category` may be authored as a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OneOrManyVisitor;

        impl<'de> Visitor<'de> for OneOrManyVisitor {
            type Value = OneOrMany;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a value or a list of values")
            }

            fn visit_unit<E: de::Error>(self) -> Result<OneOrMany, E> {
                Ok(OneOrMany::default())
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<OneOrMany, E> {
                Ok(OneOrMany::One(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<OneOrMany, E> {
                Ok(OneOrMany::One(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<OneOrMany, E> {
                Ok(OneOrMany::One(value.to_string()))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<OneOrMany, E> {
                Ok(OneOrMany::One(value.to_string()))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<OneOrMany, E> {
                Ok(OneOrMany::One(value.to_string()))
            }

            fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<OneOrMany, S::Error> {
                let mut items = Vec::new();
                while let Some(ScalarText(item)) = seq.next_element()? {
                    items.push(item);
                }
                Ok(OneOrMany::Many(items))
            }
        }

        deserializer.deserialize_any(OneOrManyVisitor)
    }
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        let items = match self {
            OneOrMany::One(one) => vec![one.clone()],
            OneOrMany::Many(many) => many.clone(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Frontmatter metadata from markdown files
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "optional_text")]
    pub title: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "optional_text")]
    pub date: Option<String>,

    #[serde(default)]
    pub category: OneOrMany,

    #[serde(default)]
    pub tag: OneOrMany,

    #[serde(default)]
    pub author: Option<String>,

    /// Sort key among siblings in generated sidebars
    #[serde(default)]
    pub order: Option<i64>,

    #[serde(default)]
    pub draft: bool,

    /// `article: false` keeps a page out of blog listings
    #[serde(default)]
    pub article: Option<bool>,

    #[serde(default)]
    pub star: bool,

    #[serde(default)]
    pub permalink: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,
}

/// One entry of a page's heading outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHeader {
    pub level: u32,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub children: Vec<PageHeader>,
}

/// A single compiled content file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// URL path without the site base, e.g. `/react/react.html` or `/react/`
    pub route: String,

    /// Source file relative to the content directory
    pub source_path: String,

    pub title: String,

    pub lang: String,

    pub frontmatter: Frontmatter,

    pub content_html: String,

    pub headers: Vec<PageHeader>,

    pub word_count: usize,

    /// Minutes
    pub reading_time: u32,

    pub date: Option<NaiveDate>,

    pub tags: Vec<String>,

    pub categories: Vec<String>,

    /// Link keys of internal pages this page links to
    pub outgoing_links: Vec<String>,

    /// Markdown body without frontmatter
    pub raw_body: Option<String>,
}

impl Page {
    /// Output file relative to the output directory (no leading slash)
    pub fn output_rel_path(&self) -> String {
        output_rel_path(&self.route)
    }

    /// Route with the site base applied
    pub fn url_with_base(&self, base: &str) -> String {
        with_base(base, &self.route)
    }

    /// Normalized link key this page answers to
    pub fn link_key(&self) -> String {
        link_key(&self.route)
    }

    pub fn is_draft(&self) -> bool {
        self.frontmatter.draft
    }

    /// Whether the page belongs in blog listings
    pub fn is_article(&self) -> bool {
        !self.is_draft() && self.frontmatter.article.unwrap_or(true) && self.route != "/"
    }

    pub fn description(&self) -> Option<&str> {
        self.frontmatter.description.as_deref()
    }
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// A problem found while building the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable machine-readable code, e.g. `nav.broken-link`
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        severity: DiagnosticSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            route: None,
            source_path: None,
            context: None,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_source(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Everything a build produced, ready for rendering
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteIndex {
    pub pages: Vec<Page>,
    pub navbar: Vec<NavNode>,
    pub sidebar: ResolvedSidebar,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteIndex {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn find_by_route(&self, route: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.route == route)
    }

    /// Find the page an authored link points at (`/a/b`, `/a/b.md`, `/a/b.html`, ...)
    ///
    /// Routes win; a permalinked page can still be named by its source file.
    pub fn find_by_link(&self, link: &str) -> Option<&Page> {
        let key = link_key(link);
        self.pages
            .iter()
            .find(|p| p.link_key() == key)
            .or_else(|| {
                self.pages
                    .iter()
                    .find(|p| !p.source_path.is_empty() && link_key(&p.source_path) == key)
            })
    }

    /// Pages that will be written out
    pub fn published(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| !p.is_draft())
    }

    /// Blog articles, starred first, then newest first, then by title
    pub fn articles(&self) -> Vec<&Page> {
        let mut articles: Vec<&Page> = self.pages.iter().filter(|p| p.is_article()).collect();
        articles.sort_by(|a, b| {
            b.frontmatter
                .star
                .cmp(&a.frontmatter.star)
                .then_with(|| b.date.cmp(&a.date))
                .then_with(|| a.title.cmp(&b.title))
        });
        articles
    }

    /// Articles grouped by tag, keyed by the tag as authored
    pub fn by_tag(&self) -> BTreeMap<String, Vec<&Page>> {
        let mut groups: BTreeMap<String, Vec<&Page>> = BTreeMap::new();
        for page in self.articles() {
            for tag in &page.tags {
                groups.entry(tag.clone()).or_default().push(page);
            }
        }
        groups
    }

    /// Articles grouped by category, keyed by the category as authored
    pub fn by_category(&self) -> BTreeMap<String, Vec<&Page>> {
        let mut groups: BTreeMap<String, Vec<&Page>> = BTreeMap::new();
        for page in self.articles() {
            for category in &page.categories {
                groups.entry(category.clone()).or_default().push(page);
            }
        }
        groups
    }

    pub fn error_count(&self) -> usize {
        self.count(DiagnosticSeverity::Error)
    }

    pub fn count(&self, severity: DiagnosticSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Normalize an internal link to the key pages are matched on.
///
/// Query strings and fragments are dropped; `.md` and `.html` suffixes are
/// stripped; `README`/`index` files collapse onto their directory.
///
/// ```
/// use notesite_core::models::link_key;
///
/// assert_eq!(link_key("/react/react.md"), "/react/react");
/// assert_eq!(link_key("react/README.md#intro"), "/react/");
/// assert_eq!(link_key("/"), "/");
/// ```
pub fn link_key(link: &str) -> String {
    let path = link
        .split(['#', '?'])
        .next()
        .unwrap_or("")
        .trim();

    let mut key = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if key.ends_with('/') {
        return key;
    }

    for ext in [".md", ".html"] {
        if let Some(stripped) = key.strip_suffix(ext) {
            key = stripped.to_string();
            break;
        }
    }

    let (dir, file) = match key.rfind('/') {
        Some(pos) => key.split_at(pos + 1),
        None => ("/", key.as_str()),
    };
    if file.eq_ignore_ascii_case("readme") || file == "index" {
        return dir.to_string();
    }

    key
}

/// Whether a link leaves the site
pub fn is_external(link: &str) -> bool {
    link.contains("://") || link.starts_with("mailto:") || link.starts_with("tel:")
}

/// Output file for a route: directory routes get `index.html`
pub fn output_rel_path(route: &str) -> String {
    let trimmed = route.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{}index.html", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Prefix a site-relative route with the normalized base (`/notes/`)
pub fn with_base(base: &str, route: &str) -> String {
    format!(
        "{}{}",
        crate::config::normalize_base_url(base),
        route.trim_start_matches('/')
    )
}
