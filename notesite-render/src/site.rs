//! Turns a built [`SiteIndex`] into HTML documents.

use crate::comment::render_comment;
use crate::nav::{href, render_head_tags, render_navbar, render_sidebar, render_toc};
use crate::templates::{
    Chrome, ListingEntry, ListingTemplate, NotFoundTemplate, PageTemplate, Pagination, TagLink,
};
use crate::RenderError;
use askama::Template;
use notesite_core::models::with_base;
use notesite_core::{slugify, Config, Page, SiteIndex, SlugDeduper};
use std::collections::BTreeMap;

/// Listing route for each name, under `/<kind>/`.
///
/// Names that slugify alike (`C++`, `C#`) are told apart by a numeric
/// suffix, in name order. Names with nothing sluggable become `untitled`.
pub fn listing_routes<'n>(
    kind: &str,
    names: impl IntoIterator<Item = &'n String>,
) -> BTreeMap<String, String> {
    let mut deduper = SlugDeduper::new();
    names
        .into_iter()
        .map(|name| {
            let slug = deduper.unique_or(name, "untitled");
            (name.clone(), format!("/{}/{}/", kind, slug))
        })
        .collect()
}

/// Route of page `n` (1-based) of the article list
pub fn article_route(n: usize) -> String {
    if n <= 1 {
        "/article/".to_string()
    } else {
        format!("/article/{}/", n)
    }
}

/// A rendered document and the route it is served at
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub route: String,
    pub html: String,
}

pub struct SiteRenderer<'a> {
    config: &'a Config,
    index: &'a SiteIndex,
    base: String,
    head_html: String,
    theme_style: String,
    tag_routes: BTreeMap<String, String>,
    category_routes: BTreeMap<String, String>,
}

impl<'a> SiteRenderer<'a> {
    pub fn new(config: &'a Config, index: &'a SiteIndex) -> Self {
        Self {
            config,
            index,
            base: config.normalized_base(),
            head_html: render_head_tags(&config.site.head),
            theme_style: theme_style(&config.theme.theme_color),
            tag_routes: listing_routes("tag", index.by_tag().keys()),
            category_routes: listing_routes("category", index.by_category().keys()),
        }
    }

    /// Route of the listing for `tag`, if any article carries it
    pub fn tag_route(&self, tag: &str) -> Option<&str> {
        self.tag_routes.get(tag).map(String::as_str)
    }

    /// Route of the listing for `category`, if any article carries it
    pub fn category_route(&self, category: &str) -> Option<&str> {
        self.category_routes.get(category).map(String::as_str)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn blog_enabled(&self) -> bool {
        self.config.theme.plugins.blog.enabled()
    }

    /// Layout data for the document at `route`
    pub fn chrome(&self, route: &str, title: Option<&str>, description: Option<&str>) -> Chrome {
        let site = &self.config.site;
        let theme = &self.config.theme;

        let page_title = match title {
            Some(title) if title != site.title => format!("{} | {}", title, site.title),
            _ => site.title.clone(),
        };

        Chrome {
            site_title: site.title.clone(),
            page_title,
            description: description.unwrap_or(&site.description).to_string(),
            lang: site.lang.clone(),
            base: self.base.clone(),
            canonical: theme
                .hostname
                .as_deref()
                .map(|host| format!("{}{}", host.trim_end_matches('/'), with_base(&self.base, route))),
            head_html: self.head_html.clone(),
            theme_style: self.theme_style.clone(),
            darkmode: theme.darkmode.as_str().to_string(),
            has_toggle: theme.darkmode.has_toggle(),
            logo: theme.logo.as_deref().map(|logo| href(&self.base, logo)),
            repo: theme.repo.clone(),
            navbar_html: render_navbar(&self.index.navbar, &self.base, route),
            search_enabled: theme.plugins.search,
            footer_html: if theme.display_footer {
                theme.footer.clone()
            } else {
                None
            },
            copyright: if theme.display_footer {
                theme.copyright.clone()
            } else {
                None
            },
        }
    }

    pub fn render_page(&self, page: &Page) -> Result<String, RenderError> {
        let theme = &self.config.theme;
        let mut chrome = self.chrome(&page.route, Some(&page.title), page.description());
        chrome.lang = page.lang.clone();

        let sidebar_html = self
            .index
            .sidebar
            .for_route(&page.route)
            .filter(|nodes| !nodes.is_empty())
            .map(|nodes| render_sidebar(nodes, &self.base, &page.route));

        let comment_html = theme
            .plugins
            .comment
            .as_ref()
            .and_then(|cfg| render_comment(cfg, &page.url_with_base(&self.base)));

        let template = PageTemplate {
            chrome,
            title: page.title.clone(),
            show_title: !page.content_html.contains("<h1"),
            content: page.content_html.clone(),
            sidebar_html,
            toc_html: render_toc(&page.headers),
            author: page
                .frontmatter
                .author
                .clone()
                .or_else(|| theme.author.clone()),
            date: page.date.map(|d| d.format("%Y-%m-%d").to_string()),
            reading_time: page.reading_time,
            word_count: page.word_count,
            tags: page
                .tags
                .iter()
                .map(|t| self.label_link(t, self.tag_route(t)))
                .collect(),
            categories: page
                .categories
                .iter()
                .map(|c| self.label_link(c, self.category_route(c)))
                .collect(),
            comment_html,
        };

        Ok(template.render()?)
    }

    pub fn render_not_found(&self) -> Result<String, RenderError> {
        let template = NotFoundTemplate {
            chrome: self.chrome("/404.html", Some("Page not found"), None),
        };
        Ok(template.render()?)
    }

    /// Article list, tag and category pages; empty unless the blog plugin is on
    pub fn blog_pages(&self) -> Result<Vec<RenderedPage>, RenderError> {
        if !self.blog_enabled() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        let articles = self.index.articles();
        let per_page = self.config.theme.plugins.blog.article_per_page();
        let chunks: Vec<&[&Page]> = if articles.is_empty() {
            vec![articles.as_slice()]
        } else {
            articles.chunks(per_page).collect()
        };
        let total = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            let n = i + 1;
            let route = article_route(n);
            let pagination = (total > 1).then(|| Pagination {
                current: n,
                total,
                prev: (n > 1).then(|| with_base(&self.base, &article_route(n - 1))),
                next: (n < total).then(|| with_base(&self.base, &article_route(n + 1))),
            });
            let html = self.render_listing(&route, "Articles", chunk, Vec::new(), pagination)?;
            pages.push(RenderedPage { route, html });
        }

        pages.extend(self.group_pages(
            "/tag/",
            "Tags",
            "Tag",
            &self.index.by_tag(),
            &self.tag_routes,
        )?);
        pages.extend(self.group_pages(
            "/category/",
            "Categories",
            "Category",
            &self.index.by_category(),
            &self.category_routes,
        )?);

        Ok(pages)
    }

    fn group_pages(
        &self,
        index_route: &str,
        index_heading: &str,
        label: &str,
        groups: &BTreeMap<String, Vec<&Page>>,
        routes: &BTreeMap<String, String>,
    ) -> Result<Vec<RenderedPage>, RenderError> {
        let route_for = |name: &str| {
            routes
                .get(name)
                .cloned()
                .unwrap_or_else(|| index_route.to_string())
        };

        let links: Vec<TagLink> = groups
            .iter()
            .map(|(name, pages)| TagLink {
                name: name.clone(),
                url: Some(with_base(&self.base, &route_for(name.as_str()))),
                count: pages.len(),
            })
            .collect();

        let mut pages = vec![RenderedPage {
            route: index_route.to_string(),
            html: self.render_listing(index_route, index_heading, &[], links, None)?,
        }];

        for (name, members) in groups {
            let route = route_for(name.as_str());
            let heading = format!("{}: {}", label, name);
            let html = self.render_listing(&route, &heading, members, Vec::new(), None)?;
            pages.push(RenderedPage { route, html });
        }

        Ok(pages)
    }

    fn render_listing(
        &self,
        route: &str,
        heading: &str,
        articles: &[&Page],
        groups: Vec<TagLink>,
        pagination: Option<Pagination>,
    ) -> Result<String, RenderError> {
        let template = ListingTemplate {
            chrome: self.chrome(route, Some(heading), None),
            heading: heading.to_string(),
            entries: articles.iter().map(|page| self.listing_entry(page)).collect(),
            groups,
            pagination,
        };
        Ok(template.render()?)
    }

    fn listing_entry(&self, page: &Page) -> ListingEntry {
        ListingEntry {
            title: page.title.clone(),
            url: page.url_with_base(&self.base),
            date: page.date.map(|d| d.format("%Y-%m-%d").to_string()),
            description: page.description().map(str::to_string),
            tags: page.tags.clone(),
            star: page.frontmatter.star,
            reading_time: page.reading_time,
        }
    }

    fn label_link(&self, name: &str, route: Option<&str>) -> TagLink {
        TagLink {
            name: name.to_string(),
            url: route
                .filter(|_| self.blog_enabled())
                .map(|route| with_base(&self.base, route)),
            count: 0,
        }
    }
}

/// `themeColor` entries as CSS custom properties; the first is also the accent
fn theme_style(colors: &BTreeMap<String, String>) -> String {
    if colors.is_empty() {
        return String::new();
    }

    let clean = |v: &str| v.replace(['<', '>', ';', '{', '}'], "");
    let mut css = String::from(":root{");
    for (name, value) in colors {
        css.push_str(&format!("--theme-{}:{};", slugify(name), clean(value)));
    }
    if let Some(first) = colors.values().next() {
        css.push_str(&format!("--theme-color:{};", clean(first)));
    }
    css.push('}');
    css
}
