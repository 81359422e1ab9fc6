//! Site building logic: discovers content, parses it into pages and
//! resolves navigation against the result.

use crate::{
    config::Config,
    frontmatter::{parse_date, parse_frontmatter},
    markdown::{LinkContext, MarkdownProcessor},
    metrics::{reading_time, word_count},
    models::*,
    navigation::{resolve_navbar, resolve_sidebar},
};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Duplicate route {route}: both {first} and {second} map to it")]
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },
}

/// A content file after the first pass: routed, front-matter parsed
struct Pending {
    source_path: String,
    route: String,
    frontmatter: Frontmatter,
    body: String,
    stem: String,
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    processor: MarkdownProcessor,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        let processor = MarkdownProcessor::new(&config.theme.plugins.md_enhance);
        Self { config, processor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the site index. Nothing is written to disk.
    pub fn build(&self) -> Result<SiteIndex, BuildError> {
        let source_dir = self.config.source_dir();
        if !source_dir.is_dir() {
            return Err(BuildError::SourceMissing(source_dir));
        }

        let files = self.discover_markdown_files(&source_dir)?;
        tracing::info!("Found {} markdown files", files.len());

        let mut diagnostics = self.config.diagnostics();

        // First pass: front-matter and routes
        let mut pending: Vec<Pending> = Vec::new();
        let mut owners: HashMap<String, String> = HashMap::new();
        let mut routes: HashMap<String, String> = HashMap::new();

        for path in &files {
            let source_path = relative_source(path, &source_dir);
            let content = fs::read_to_string(path)?;

            let (frontmatter, body) = match parse_frontmatter(&content) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", source_path, e);
                    diagnostics.push(
                        Diagnostic::new("frontmatter.invalid", DiagnosticSeverity::Error, e.to_string())
                            .with_source(source_path),
                    );
                    continue;
                }
            };

            let route = match frontmatter.permalink.as_deref() {
                Some(permalink) if !permalink.trim().is_empty() => normalize_permalink(permalink),
                _ => route_for_source(&source_path),
            };

            if let Some(first) = owners.get(&route) {
                return Err(BuildError::DuplicateRoute {
                    route,
                    first: first.clone(),
                    second: source_path,
                });
            }
            owners.insert(route.clone(), source_path.clone());

            // Links may name the page by route or by source file
            routes.insert(link_key(&route), route.clone());
            routes
                .entry(link_key(&source_path))
                .or_insert_with(|| route.clone());

            let stem = Path::new(&source_path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("untitled")
                .to_string();

            pending.push(Pending {
                source_path,
                route,
                frontmatter,
                body,
                stem,
            });
        }

        // Second pass: render markdown with link resolution
        let base = self.config.normalized_base();
        let mut pages = Vec::with_capacity(pending.len());
        for item in pending {
            let (page, mut page_diags) = self.render_page(item, &base, &routes);
            diagnostics.append(&mut page_diags);
            pages.push(page);
        }

        let mut index = SiteIndex::new(pages);
        diagnostics.extend(broken_link_diagnostics(&index, &routes));

        let (navbar, mut nav_diags) = resolve_navbar(&self.config.theme.navbar, &index);
        diagnostics.append(&mut nav_diags);
        let (sidebar, mut sidebar_diags) = resolve_sidebar(&self.config.theme.sidebar, &index);
        diagnostics.append(&mut sidebar_diags);

        index.navbar = navbar;
        index.sidebar = sidebar;
        index.diagnostics = diagnostics;

        tracing::info!(
            "Built site index with {} pages ({} errors, {} warnings)",
            index.pages.len(),
            index.error_count(),
            index.count(DiagnosticSeverity::Warning)
        );

        Ok(index)
    }

    fn render_page(
        &self,
        item: Pending,
        base: &str,
        routes: &HashMap<String, String>,
    ) -> (Page, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let current_dir = source_dir_route(&item.source_path);
        let ctx = LinkContext {
            current_dir: &current_dir,
            base,
            header_depth: self.config.theme.header_depth,
            routes,
        };
        let rendered = self.processor.convert(&item.body, &ctx);
        tracing::debug!("Rendered {} -> {}", item.source_path, item.route);

        let fm = &item.frontmatter;
        let title = match fm.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => match rendered.first_h1.clone().filter(|t| !t.is_empty()) {
                Some(h1) => h1,
                None => {
                    diagnostics.push(
                        Diagnostic::new(
                            "page.untitled",
                            DiagnosticSeverity::Info,
                            format!("No title or level-1 heading; using '{}'", item.stem),
                        )
                        .with_route(item.route.clone())
                        .with_source(item.source_path.clone()),
                    );
                    item.stem.clone()
                }
            },
        };

        let date = match fm.date.as_deref() {
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    diagnostics.push(
                        Diagnostic::new(
                            "page.invalid-date",
                            DiagnosticSeverity::Warning,
                            format!("Unrecognised date '{}'", raw),
                        )
                        .with_route(item.route.clone())
                        .with_source(item.source_path.clone()),
                    );
                }
                parsed
            }
            None => None,
        };

        let words = word_count(&rendered.plain_text);

        let page = Page {
            route: item.route,
            source_path: item.source_path,
            title,
            lang: fm
                .lang
                .clone()
                .unwrap_or_else(|| self.config.site.lang.clone()),
            content_html: rendered.html,
            headers: rendered.headers,
            word_count: words,
            reading_time: reading_time(words),
            date,
            tags: fm.tag.to_vec(),
            categories: fm.category.to_vec(),
            outgoing_links: rendered.links,
            raw_body: Some(item.body),
            frontmatter: item.frontmatter,
        };

        (page, diagnostics)
    }

    /// Discover all markdown files under the content directory
    fn discover_markdown_files(&self, source_dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
        let mut files = Vec::new();
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);

        let walker = WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            // Dot directories hold tooling state, not content
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            let rel = relative_source(entry.path(), source_dir);
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }

            files.push(entry.path().to_path_buf());
        }

        Ok(files)
    }
}

/// Path relative to the content directory, always with `/` separators
fn relative_source(path: &Path, source_dir: &Path) -> String {
    path.strip_prefix(source_dir)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Route for a content file: `react/README.md` is `/react/`,
/// `react/react.md` is `/react/react.html`.
///
/// ```
/// use notesite_core::builder::route_for_source;
///
/// assert_eq!(route_for_source("README.md"), "/");
/// assert_eq!(route_for_source("react/README.md"), "/react/");
/// assert_eq!(route_for_source("react/index.md"), "/react/");
/// assert_eq!(route_for_source("react/react.md"), "/react/react.html");
/// ```
pub fn route_for_source(source_path: &str) -> String {
    let dir = source_dir_route(source_path);
    let file = source_path.rsplit('/').next().unwrap_or(source_path);
    let stem = file.strip_suffix(".md").unwrap_or(file);

    if stem.eq_ignore_ascii_case("readme") || stem == "index" {
        dir
    } else {
        format!("{}{}.html", dir, stem)
    }
}

/// Route of the directory holding a source file, e.g. `/react/`
fn source_dir_route(source_path: &str) -> String {
    match source_path.rfind('/') {
        Some(pos) => format!("/{}/", &source_path[..pos]),
        None => "/".to_string(),
    }
}

/// `permalink: /custom/` stays a directory route; `/about` becomes `/about.html`
fn normalize_permalink(raw: &str) -> String {
    let mut route = raw.trim().to_string();
    if !route.starts_with('/') {
        route.insert(0, '/');
    }
    let last = route.rsplit('/').next().unwrap_or("");
    if !last.is_empty() && !last.contains('.') {
        route.push_str(".html");
    }
    route
}

fn broken_link_diagnostics(index: &SiteIndex, routes: &HashMap<String, String>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for page in &index.pages {
        for key in &page.outgoing_links {
            let reason = match routes.get(key).and_then(|r| index.find_by_route(r)) {
                None => "does not resolve to any page",
                Some(target) if target.is_draft() && !page.is_draft() => "points at a draft page",
                Some(_) => continue,
            };
            diagnostics.push(
                Diagnostic::new(
                    "page.broken-link",
                    DiagnosticSeverity::Warning,
                    format!("Link '{}' {}", key, reason),
                )
                .with_route(page.route.clone())
                .with_source(page.source_path.clone())
                .with_context(key.clone()),
            );
        }
    }

    diagnostics
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build(yaml: &str, files: &[(&str, &str)]) -> SiteIndex {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notesite.yml", yaml);
        for (rel, content) in files {
            write(dir.path(), &format!("docs/{}", rel), content);
        }
        let config = Config::from_file(dir.path().join("notesite.yml")).unwrap();
        SiteBuilder::new(config).build().unwrap()
    }

    const CONFIG: &str = "site:\n  title: Notes\n";

    fn codes(index: &SiteIndex) -> Vec<&str> {
        index.diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn test_routes_and_titles() {
        let index = build(
            CONFIG,
            &[
                ("README.md", "---\ntitle: Home\n---\nWelcome\n"),
                ("react/README.md", "# React Notes\n"),
                ("react/react.md", "---\ntitle: React\n---\nBody\n"),
                ("react/hooks.md", "No heading here\n"),
            ],
        );

        let home = index.find_by_route("/").unwrap();
        assert_eq!(home.title, "Home");
        assert_eq!(index.find_by_route("/react/").unwrap().title, "React Notes");
        assert_eq!(index.find_by_link("/react/react").unwrap().title, "React");

        let hooks = index.find_by_route("/react/hooks.html").unwrap();
        assert_eq!(hooks.title, "hooks");
        assert_eq!(hooks.source_path, "react/hooks.md");
        assert_eq!(codes(&index), vec!["page.untitled"]);
    }

    #[test]
    fn test_page_metadata() {
        let index = build(
            CONFIG,
            &[(
                "regexp/boundary.md",
                "---\ntitle: Boundaries\ndate: 2022-03-14\ntag: [regexp, javascript]\ncategory: notes\n---\n## Word\n\nMatch a word boundary.\n\n### Example\n",
            )],
        );
        let page = index.find_by_route("/regexp/boundary.html").unwrap();
        assert_eq!(page.date, chrono::NaiveDate::from_ymd_opt(2022, 3, 14));
        assert_eq!(page.tags, vec!["regexp", "javascript"]);
        assert_eq!(page.categories, vec!["notes"]);
        assert_eq!(page.word_count, 6);
        assert_eq!(page.reading_time, 1);
        assert_eq!(page.headers.len(), 1);
        assert_eq!(page.headers[0].children[0].slug, "example");
        assert_eq!(page.lang, "en-US");
    }

    #[test]
    fn test_permalink_and_links() {
        let index = build(
            CONFIG,
            &[
                ("about.md", "---\ntitle: About\npermalink: /me\n---\n[Guide](guide/intro.md) [Missing](./gone.md)\n"),
                ("guide/intro.md", "# Intro\n[Back](../about.md)\n"),
            ],
        );

        let about = index.find_by_route("/me.html").unwrap();
        assert!(about.content_html.contains("href=\"/guide/intro.html\""));
        let intro = index.find_by_route("/guide/intro.html").unwrap();
        assert!(intro.content_html.contains("href=\"/me.html\""));

        let broken: Vec<_> = index
            .diagnostics
            .iter()
            .filter(|d| d.code == "page.broken-link")
            .collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].context.as_deref(), Some("/gone"));
        assert_eq!(broken[0].route.as_deref(), Some("/me.html"));
    }

    #[test]
    fn test_invalid_frontmatter_and_date() {
        let index = build(
            CONFIG,
            &[
                ("bad.md", "---\ntitle: [unclosed\n---\nBody\n"),
                ("odd.md", "---\ntitle: Odd\ndate: someday\n---\n"),
            ],
        );
        assert!(index.find_by_route("/bad.html").is_none());
        assert_eq!(codes(&index), vec!["frontmatter.invalid", "page.invalid-date"]);
        assert_eq!(index.error_count(), 1);
    }

    #[test]
    fn test_duplicate_route_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notesite.yml", CONFIG);
        write(dir.path(), "docs/react/README.md", "# A\n");
        write(dir.path(), "docs/react/index.md", "# B\n");
        let config = Config::from_file(dir.path().join("notesite.yml")).unwrap();

        let err = SiteBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, BuildError::DuplicateRoute { ref route, .. } if route == "/react/"));
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notesite.yml", CONFIG);
        let config = Config::from_file(dir.path().join("notesite.yml")).unwrap();
        assert!(matches!(
            SiteBuilder::new(config).build(),
            Err(BuildError::SourceMissing(_))
        ));
    }

    #[test]
    fn test_ignored_and_hidden_files() {
        let index = build(
            "site:\n  title: Notes\nignore_patterns:\n  - '^drafts/'\n",
            &[
                ("README.md", "# Home\n"),
                ("drafts/wip.md", "# WIP\n"),
                (".vuepress/config.md", "# Tooling\n"),
                ("regexp/test.js", "// not markdown\n"),
            ],
        );
        assert_eq!(index.pages.len(), 1);
    }

    #[test]
    fn test_navigation_is_resolved() {
        let yaml = r#"
site:
  title: Notes
theme:
  navbar:
    - /react/react
    - text: Missing
      link: /vue/
  sidebar:
    /react/:
      - text: React
        link: /react/react
"#;
        let index = build(
            yaml,
            &[
                ("react/README.md", "# React\n"),
                ("react/react.md", "---\ntitle: React Basics\n---\n"),
            ],
        );

        assert_eq!(index.navbar[0].text, "React Basics");
        assert_eq!(index.navbar[0].link.as_deref(), Some("/react/react.html"));
        let sidebar = index.sidebar.for_route("/react/react.html").unwrap();
        assert_eq!(sidebar[0].text, "React");
        assert_eq!(codes(&index), vec!["nav.broken-link"]);
    }

    #[test]
    fn test_permalink_normalization() {
        assert_eq!(normalize_permalink("/custom/"), "/custom/");
        assert_eq!(normalize_permalink("about"), "/about.html");
        assert_eq!(normalize_permalink("/feed.xml.html"), "/feed.xml.html");
    }
}
