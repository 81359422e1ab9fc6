//! Search command implementation.

use anyhow::{bail, Context, Result};
use notesite_core::{perform_search, Config, SearchEntry};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// One ranked search hit as emitted by `search --json` and `/api/search`
#[derive(Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub entry: &'a SearchEntry,
    pub score: f32,
}

#[derive(Serialize)]
pub struct SearchResults<'a> {
    pub query: &'a str,
    pub results: Vec<SearchHit<'a>>,
}

impl<'a> SearchResults<'a> {
    pub fn new(query: &'a str, hits: Vec<(&'a SearchEntry, f32)>) -> Self {
        Self {
            query,
            results: hits
                .into_iter()
                .map(|(entry, score)| SearchHit { entry, score })
                .collect(),
        }
    }
}

/// Search the index written by the last build
pub fn search_site(config_path: &Path, query: &str, limit: usize, json: bool) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let index_path = config.output_dir().join("search-index.json");

    if !index_path.exists() {
        bail!(
            "Search index not found at {:?}. Run `notesite build` first.",
            index_path
        );
    }

    let index_json = fs::read_to_string(&index_path).context("Failed to read search index")?;
    let entries: Vec<SearchEntry> =
        serde_json::from_str(&index_json).context("Failed to parse search index")?;

    let hits = perform_search(&entries, query, limit);

    if json {
        let payload = SearchResults::new(query, hits);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results found for '{}'", query);
        return Ok(());
    }

    println!("Found {} results for '{}':\n", hits.len(), query);
    for (entry, _score) in &hits {
        print_search_result(entry);
    }

    Ok(())
}

fn print_search_result(entry: &SearchEntry) {
    // React Hooks › useEffect
    //   /react/hooks.html#useeffect
    //   Runs after every render unless...
    let heading = if entry.section_title.is_empty() || entry.section_title == entry.title {
        entry.title.clone()
    } else {
        format!("{} › {}", entry.title, entry.section_title)
    };

    println!("{}", heading);
    println!("  {}", entry.url);
    if !entry.snippet.is_empty() {
        println!("  {}", entry.snippet);
    }
    println!();
}
