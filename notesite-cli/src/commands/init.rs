//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../notesite.yml.example");

const HOME_PAGE: &str = r#"---
title: Home
article: false
---

# My Notes

Welcome! Start with the [guide](guide/README.md).
"#;

const GUIDE_INDEX: &str = r#"---
title: Guide
article: false
---

# Guide

Every Markdown file under `docs/` becomes a page. `README.md` files map to
their directory, so this page is served at `/guide/`.
"#;

const GETTING_STARTED: &str = r#"---
title: Getting Started
date: 2024-01-01
tag: [notesite]
order: 1
---

# Getting Started

Edit `notesite.yml` to change the site title, navbar and sidebar, then run:

```bash
notesite build
notesite dev
```

## Linking

Link to other notes by their source path, e.g. [the guide](./README.md).
"#;

/// Initialize a new notesite project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_docs(root)?;

    println!("✓ notesite initialized in {:?}", root);
    println!("  - Edit notesite.yml to customize site metadata and navigation");
    println!("  - Write notes in docs/");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("notesite.yml");
    if config_path.exists() {
        println!("notesite.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_docs(root: &Path) -> Result<()> {
    let docs = root.join("docs");
    let guide = docs.join("guide");
    fs::create_dir_all(&guide).with_context(|| format!("Failed to create {:?}", guide))?;

    for (path, contents) in [
        (docs.join("README.md"), HOME_PAGE),
        (guide.join("README.md"), GUIDE_INDEX),
        (guide.join("getting-started.md"), GETTING_STARTED),
    ] {
        if path.exists() {
            continue;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Created {:?}", path);
    }

    Ok(())
}
