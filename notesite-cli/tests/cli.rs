use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn notesite(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("notesite").expect("notesite binary");
    cmd.current_dir(dir).env_remove("NOTESITE_CONFIG");
    cmd
}

fn init(dir: &Path) {
    notesite(dir).arg("init").assert().success();
}

fn edit_config(dir: &Path, edit: impl FnOnce(String) -> String) -> TestResult {
    let path = dir.join("notesite.yml");
    let config = fs::read_to_string(&path)?;
    fs::write(&path, edit(config))?;
    Ok(())
}

#[test]
fn init_then_build_writes_site() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());
    assert!(dir.path().join("notesite.yml").exists());
    assert!(dir.path().join("docs/guide/getting-started.md").exists());

    notesite(dir.path()).args(["build", "--strict"]).assert().success();

    let dist = dir.path().join("dist");
    for file in [
        "index.html",
        "guide/index.html",
        "guide/getting-started.html",
        "404.html",
        "search-index.json",
        "assets/style.css",
        "assets/app.js",
    ] {
        assert!(dist.join(file).exists(), "missing {}", file);
    }
    // Blog and hostname are off in the scaffold
    assert!(!dist.join("rss.xml").exists());
    assert!(!dist.join("sitemap.xml").exists());

    let page = fs::read_to_string(dist.join("guide/getting-started.html"))?;
    assert!(page.contains("<title>Getting Started | My Notes</title>"));
    assert!(page.contains("href=\"/guide/\""));
    assert!(page.contains("id=\"linking\""));
    Ok(())
}

#[test]
fn verify_scaffold_is_clean() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());

    notesite(dir.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors"));
    Ok(())
}

#[test]
fn verify_json_reports_broken_navigation() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());
    edit_config(dir.path(), |config| {
        config.replace("      link: /guide/", "      link: /missing/")
    })?;

    let assert = notesite(dir.path())
        .args(["verify", "--json"])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["errors"], 1);
    let codes: Vec<&str> = value["diagnostics"]
        .as_array()
        .expect("diagnostics array")
        .iter()
        .filter_map(|d| d["code"].as_str())
        .collect();
    assert!(codes.contains(&"nav.broken-link"));
    Ok(())
}

#[test]
fn strict_build_refuses_to_write_on_errors() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());
    edit_config(dir.path(), |config| {
        config.replace("      link: /guide/", "      link: /missing/")
    })?;

    notesite(dir.path())
        .args(["build", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error diagnostic"));
    assert!(!dir.path().join("dist/index.html").exists());

    // Without --strict the site is still written
    notesite(dir.path()).arg("build").assert().success();
    assert!(dir.path().join("dist/index.html").exists());
    Ok(())
}

#[test]
fn page_command_formats() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());

    let assert = notesite(dir.path())
        .args(["page", "guide/getting-started.md"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["title"], "Getting Started");
    assert_eq!(value["route"], "/guide/getting-started.html");
    assert_eq!(value["url"], "/guide/getting-started.html");

    notesite(dir.path())
        .args(["page", "/guide/", "--format", "raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Guide"));

    notesite(dir.path())
        .args(["page", "/guide/getting-started", "--format", "frontmatter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title: Getting Started"));

    notesite(dir.path())
        .args(["page", "/nope.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn search_uses_built_index() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());

    notesite(dir.path())
        .args(["search", "linking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("notesite build"));

    notesite(dir.path()).arg("build").assert().success();

    let assert = notesite(dir.path())
        .args(["search", "linking", "--json", "--limit", "1"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    let results = value["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["url"], "/guide/getting-started.html#linking");
    assert_eq!(results[0]["section_title"], "Linking");

    notesite(dir.path())
        .args(["search", "zzzz-nothing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found"));
    Ok(())
}

#[test]
fn blog_and_hostname_emit_feeds() -> TestResult {
    let dir = tempdir()?;
    init(dir.path());
    edit_config(dir.path(), |config| {
        config
            .replace("# hostname:", "hostname:")
            .replace("blog: false", "blog: true")
    })?;

    notesite(dir.path()).args(["build", "--strict"]).assert().success();

    let dist = dir.path().join("dist");
    for file in [
        "rss.xml",
        "sitemap.xml",
        "article/index.html",
        "tag/index.html",
        "tag/notesite/index.html",
        "category/index.html",
    ] {
        assert!(dist.join(file).exists(), "missing {}", file);
    }

    let rss = fs::read_to_string(dist.join("rss.xml"))?;
    assert!(rss.contains("<title>Getting Started</title>"));
    assert!(rss.contains("<link>https://notes.example.com/guide/getting-started.html</link>"));
    assert!(!rss.contains("<title>Home</title>"));

    let sitemap = fs::read_to_string(dist.join("sitemap.xml"))?;
    assert!(sitemap.contains("<loc>https://notes.example.com/guide/getting-started.html</loc>"));
    assert!(sitemap.contains("<lastmod>2024-01-01</lastmod>"));
    Ok(())
}
