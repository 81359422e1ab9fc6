//! Build command implementation.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use include_dir::{include_dir, Dir, DirEntry};
use notesite_core::models::{output_rel_path, with_base};
use notesite_core::{
    build_search_index, Config, DiagnosticSeverity, SearchEntry, SiteBuilder, SiteIndex,
};
use notesite_render::SiteRenderer;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// Embed static assets (CSS, JS) at compile time so they ship with the binary
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../static");

/// Files under this directory of the content root are copied verbatim
const PUBLIC_DIR: &str = ".vuepress/public";

/// Build the static site, optionally refusing to write output when the
/// build reports errors.
pub fn build_site(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let site_index = build_index(&config)?;
    report_diagnostics(&site_index);

    let errors = site_index.error_count();
    if strict && errors > 0 {
        bail!(
            "Build failed: {} error diagnostic(s); run `notesite verify` for details",
            errors
        );
    }

    write_site(&config, &site_index)
}

/// Build and write the site from an already loaded config, returning the index.
pub fn build_site_with_config(config: &Config) -> Result<SiteIndex> {
    let site_index = build_index(config)?;
    report_diagnostics(&site_index);
    write_site(config, &site_index)?;
    Ok(site_index)
}

fn build_index(config: &Config) -> Result<SiteIndex> {
    tracing::info!("Building site: {}", config.site.title);
    SiteBuilder::new(config.clone())
        .build()
        .context("Failed to build site")
}

fn report_diagnostics(site_index: &SiteIndex) {
    for diag in &site_index.diagnostics {
        let at = diag
            .source_path
            .as_deref()
            .or(diag.context.as_deref())
            .unwrap_or("site");
        match diag.severity {
            DiagnosticSeverity::Error => {
                tracing::error!("{} [{}]: {}", diag.code, at, diag.message)
            }
            DiagnosticSeverity::Warning => {
                tracing::warn!("{} [{}]: {}", diag.code, at, diag.message)
            }
            DiagnosticSeverity::Info => {
                tracing::debug!("{} [{}]: {}", diag.code, at, diag.message)
            }
        }
    }
}

/// Render every document and artifact into the output directory
fn write_site(config: &Config, site_index: &SiteIndex) -> Result<()> {
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let renderer = SiteRenderer::new(config, site_index);
    let base = renderer.base().to_string();

    let mut pages_written = 0;
    for page in site_index.published() {
        let html = renderer
            .render_page(page)
            .with_context(|| format!("Failed to render {}", page.source_path))?;
        write_output(&output_dir, &page.output_rel_path(), html)?;
        pages_written += 1;
        tracing::debug!("Rendered: {}", page.route);
    }

    let not_found = renderer
        .render_not_found()
        .context("Failed to render 404 page")?;
    write_output(&output_dir, "404.html", not_found)?;

    let listings = renderer
        .blog_pages()
        .context("Failed to render blog listings")?;
    if !listings.is_empty() {
        tracing::info!("Rendered {} listing pages", listings.len());
    }
    for listing in &listings {
        write_output(&output_dir, &output_rel_path(&listing.route), &listing.html)?;
    }

    if config.theme.plugins.search {
        generate_search_index(config, site_index, &base)?;
    } else {
        tracing::info!("Search disabled; skipping search-index.json");
    }

    if config.theme.sitemap_enabled() {
        let routes: Vec<&str> = listings.iter().map(|l| l.route.as_str()).collect();
        generate_sitemap(config, site_index, &base, &routes)?;
    } else {
        tracing::info!("Sitemap disabled; skipping sitemap.xml");
    }

    if config.theme.plugins.blog.enabled() {
        generate_rss(config, site_index, &base)?;
    } else {
        tracing::info!("Blog disabled; skipping rss.xml");
    }

    copy_assets(config)?;

    tracing::info!("✓ Built {} pages", pages_written);
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(())
}

fn write_output(output_dir: &Path, rel: &str, contents: impl AsRef<[u8]>) -> Result<()> {
    let target = output_dir.join(rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(&target, contents).with_context(|| format!("Failed to write {:?}", target))
}

/// Section-level search entries for every published page
pub fn search_entries(site_index: &SiteIndex, base: &str) -> Vec<SearchEntry> {
    site_index
        .published()
        .flat_map(|page| build_search_index(page, base))
        .collect()
}

fn generate_search_index(config: &Config, site_index: &SiteIndex, base: &str) -> Result<()> {
    let entries = search_entries(site_index, base);
    let json = serde_json::to_string_pretty(&entries).context("Failed to serialize search index")?;
    write_output(&config.output_dir(), "search-index.json", json)?;

    tracing::info!(
        "Generated search-index.json with {} search entries",
        entries.len()
    );
    Ok(())
}

/// Generate sitemap.xml (only called when a hostname is configured)
fn generate_sitemap(
    config: &Config,
    site_index: &SiteIndex,
    base: &str,
    extra_routes: &[&str],
) -> Result<()> {
    let hostname = config.theme.hostname.as_deref().unwrap_or_default();
    let mut urls = String::new();

    for page in site_index.published() {
        urls.push_str("<url>");
        urls.push_str(&format!(
            "<loc>{}</loc>",
            escape_xml(&absolute_url(hostname, base, &page.route))
        ));
        if let Some(date) = page.date {
            urls.push_str(&format!("<lastmod>{}</lastmod>", date.format("%Y-%m-%d")));
        }
        urls.push_str("</url>\n");
    }

    for route in extra_routes {
        urls.push_str(&format!(
            "<url><loc>{}</loc></url>\n",
            escape_xml(&absolute_url(hostname, base, route))
        ));
    }

    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}</urlset>
"#,
        urls
    );

    write_output(&config.output_dir(), "sitemap.xml", xml)?;
    tracing::info!("Generated sitemap.xml");
    Ok(())
}

/// Generate RSS feed (rss.xml) from the blog articles
fn generate_rss(config: &Config, site_index: &SiteIndex, base: &str) -> Result<()> {
    let link_for = |route: &str| match config.theme.hostname.as_deref() {
        Some(hostname) => absolute_url(hostname, base, route),
        None => with_base(base, route),
    };

    let mut articles = site_index.articles();
    articles.sort_by(|a, b| b.date.cmp(&a.date));

    let mut items = String::new();
    for page in articles {
        let link = escape_xml(&link_for(&page.route));
        items.push_str(&format!(
            "<item><title>{}</title><link>{}</link><guid>{}</guid>",
            escape_xml(&page.title),
            link,
            link
        ));
        if let Some(description) = page.description() {
            items.push_str(&format!(
                "<description>{}</description>",
                escape_xml(description)
            ));
        }
        if let Some(author) = page
            .frontmatter
            .author
            .as_deref()
            .or(config.theme.author.as_deref())
        {
            items.push_str(&format!("<author>{}</author>", escape_xml(author)));
        }
        for category in page.categories.iter().chain(&page.tags) {
            items.push_str(&format!("<category>{}</category>", escape_xml(category)));
        }
        if let Some(pub_date) = page.date.and_then(|d| naive_to_rfc2822(&d)) {
            items.push_str(&format!("<pubDate>{}</pubDate>", pub_date));
        }
        items.push_str("</item>\n");
    }

    let rss = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>{}</language>
{}  </channel>
</rss>
"#,
        escape_xml(&config.site.title),
        escape_xml(&link_for("/")),
        escape_xml(&config.site.description),
        escape_xml(&config.site.lang),
        items
    );

    write_output(&config.output_dir(), "rss.xml", rss)?;
    tracing::info!("Generated rss.xml");
    Ok(())
}

/// Copy the bundled CSS/JS, then the project's public files on top
fn copy_assets(config: &Config) -> Result<()> {
    let output_dir = config.output_dir();

    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, &output_dir)?;
    }
    tracing::debug!("Copied bundled assets");

    let public_dir = config.source_dir().join(PUBLIC_DIR);
    if public_dir.is_dir() {
        copy_dir(&public_dir, &output_dir)?;
        tracing::info!("Copied public files from {:?}", public_dir);
    }

    Ok(())
}

fn extract_entry(entry: &DirEntry, dest: &Path) -> Result<()> {
    match entry {
        DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        DirEntry::File(file) => write_output(
            dest,
            &file.path().to_string_lossy(),
            file.contents(),
        )?,
    }
    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
    }
    Ok(())
}

fn absolute_url(hostname: &str, base: &str, route: &str) -> String {
    format!(
        "{}{}",
        hostname.trim_end_matches('/'),
        with_base(base, route)
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn naive_to_rfc2822(date: &NaiveDate) -> Option<String> {
    let datetime = date.and_hms_opt(0, 0, 0)?;
    Some(datetime.and_utc().to_rfc2822())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://notes.example.com/", "/kb/", "/react/react.html"),
            "https://notes.example.com/kb/react/react.html"
        );
        assert_eq!(
            absolute_url("https://notes.example.com", "/", "/"),
            "https://notes.example.com/"
        );
    }

    #[test]
    fn test_rfc2822_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            naive_to_rfc2822(&date).as_deref(),
            Some("Fri, 1 Mar 2024 00:00:00 +0000")
        );
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
    }
}
