//! Fetch a single page in structured form.

use crate::PageFormat;
use anyhow::{Context, Result};
use notesite_core::models::link_key;
use notesite_core::{Config, Page, SiteBuilder, SiteIndex};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PagePayload<'a> {
    /// Route with the site base applied
    url: String,
    #[serde(flatten)]
    page: &'a Page,
}

/// Find a page by route, authored link or source path and print it.
pub fn show_page(config_path: &Path, link: &str, format: PageFormat) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let base = config.normalized_base();
    let site_index = SiteBuilder::new(config)
        .build()
        .context("Failed to build site")?;

    let page = find_page(&site_index, link)
        .with_context(|| format!("Page '{}' not found (route, link or source path)", link))?;

    match format {
        PageFormat::Json => {
            let payload = PagePayload {
                url: page.url_with_base(&base),
                page,
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        PageFormat::Html => {
            println!("{}", page.content_html);
        }
        PageFormat::Frontmatter => {
            let fm = serde_yaml::to_string(&page.frontmatter)
                .context("Failed to serialize frontmatter")?;
            println!("---\n{}---", fm);
        }
        PageFormat::Raw => {
            println!("{}", page.raw_body.as_deref().unwrap_or_default());
        }
    }

    Ok(())
}

fn find_page<'a>(site_index: &'a SiteIndex, link: &str) -> Option<&'a Page> {
    let key = link_key(link);
    site_index
        .find_by_route(link)
        .or_else(|| site_index.find_by_link(link))
        .or_else(|| {
            site_index
                .pages
                .iter()
                .find(|page| link_key(&page.source_path) == key)
        })
}
