//! Askama template definitions.

use askama::Template;

/// Site-wide data every layout needs
#[derive(Debug, Clone)]
pub struct Chrome {
    pub site_title: String,
    /// Contents of `<title>`
    pub page_title: String,
    pub description: String,
    pub lang: String,
    /// Normalized base path, `/` or `/notes/`
    pub base: String,
    pub canonical: Option<String>,
    /// Pre-rendered `site.head` tags
    pub head_html: String,
    /// CSS custom properties from `themeColor`
    pub theme_style: String,
    pub darkmode: String,
    pub has_toggle: bool,
    pub logo: Option<String>,
    pub repo: Option<String>,
    pub navbar_html: String,
    pub search_enabled: bool,
    pub footer_html: Option<String>,
    pub copyright: Option<String>,
}

/// A tag or category label, linked when the blog listings exist
#[derive(Debug, Clone, PartialEq)]
pub struct TagLink {
    pub name: String,
    pub url: Option<String>,
    pub count: usize,
}

/// One article in a listing
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub title: String,
    pub url: String,
    pub date: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub star: bool,
    pub reading_time: u32,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    pub current: usize,
    pub total: usize,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Content page template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub chrome: Chrome,

    pub title: String,
    /// False when the content already opens with its own `<h1>`
    pub show_title: bool,
    pub content: String,

    pub sidebar_html: Option<String>,
    pub toc_html: Option<String>,

    // Page info bar
    pub author: Option<String>,
    pub date: Option<String>,
    pub reading_time: u32,
    pub word_count: usize,
    pub tags: Vec<TagLink>,
    pub categories: Vec<TagLink>,

    pub comment_html: Option<String>,
}

/// Article, tag and category listings
#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingTemplate {
    pub chrome: Chrome,
    pub heading: String,
    pub entries: Vec<ListingEntry>,
    /// Tag or category index links (index pages only)
    pub groups: Vec<TagLink>,
    pub pagination: Option<Pagination>,
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub chrome: Chrome,
}
