//! Configuration parsing and management.

use crate::models::{Diagnostic, DiagnosticSeverity};
use crate::theme::ThemeConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Main configuration struct matching the notesite.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    /// Regexes matched against paths relative to the content directory
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,

    // Internal: dotted paths of keys serde did not recognise
    #[serde(skip)]
    unknown_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_lang")]
    pub lang: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Base path the site is served under
    #[serde(default = "default_base")]
    pub base: String,

    /// Content directory
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Output directory
    #[serde(default = "default_dest")]
    pub dest: PathBuf,

    /// Extra tags injected into every `<head>`
    #[serde(default)]
    pub head: Vec<HeadTag>,
}

fn default_lang() -> String {
    String::from("en-US")
}

fn default_base() -> String {
    String::from("/")
}

fn default_source() -> PathBuf {
    PathBuf::from("docs")
}

fn default_dest() -> PathBuf {
    PathBuf::from("dist")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// A `<head>` element, authored as `[tag, {attrs}]` or `[tag, {attrs}, content]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HeadTagRepr", into = "HeadTagRepr")]
pub struct HeadTag {
    pub tag: String,
    pub attrs: BTreeMap<String, serde_yaml::Value>,
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HeadTagRepr {
    WithContent(String, BTreeMap<String, serde_yaml::Value>, String),
    Bare(String, BTreeMap<String, serde_yaml::Value>),
}

impl From<HeadTagRepr> for HeadTag {
    fn from(repr: HeadTagRepr) -> Self {
        match repr {
            HeadTagRepr::WithContent(tag, attrs, content) => HeadTag {
                tag,
                attrs,
                content: Some(content),
            },
            HeadTagRepr::Bare(tag, attrs) => HeadTag {
                tag,
                attrs,
                content: None,
            },
        }
    }
}

impl From<HeadTag> for HeadTagRepr {
    fn from(tag: HeadTag) -> Self {
        match tag.content {
            Some(content) => HeadTagRepr::WithContent(tag.tag, tag.attrs, content),
            None => HeadTagRepr::Bare(tag.tag, tag.attrs),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text, recording unrecognised keys
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = serde_yaml::Deserializer::from_str(contents);
        let mut config: Config =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                // Optional sections show up as `?` segments
                ignored.push(path.to_string().replace(".?", ""));
            })?;

        if config.site.title.trim().is_empty() {
            return Err(ConfigError::MissingField("site.title".to_string()));
        }

        for key in &ignored {
            tracing::warn!("Unknown config key '{}' is ignored", key);
        }
        config.unknown_keys = ignored;

        Ok(config)
    }

    /// Dotted paths of keys that were present but not recognised
    pub fn unknown_keys(&self) -> &[String] {
        &self.unknown_keys
    }

    /// Configuration-level diagnostics (unknown keys, unusable plugin settings)
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .unknown_keys
            .iter()
            .map(|key| {
                Diagnostic::new(
                    "config.unknown-key",
                    DiagnosticSeverity::Warning,
                    format!("Unrecognised option '{}'", key),
                )
                .with_context(key.clone())
            })
            .collect();
        diagnostics.extend(self.theme.diagnostics());
        diagnostics
    }

    /// Get the content directory, resolved relative to config file
    pub fn source_dir(&self) -> PathBuf {
        self.resolve_path(&self.site.source)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.site.dest)
    }

    /// Directory holding the config file (the project root)
    pub fn root_dir(&self) -> PathBuf {
        self.resolve_path(Path::new(""))
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Get a nested config value using dotted path (e.g., "site.title")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["site", "title"] => Some(self.site.title.clone()),
            ["site", "lang"] => Some(self.site.lang.clone()),
            ["site", "description"] => Some(self.site.description.clone()),
            ["site", "base"] => Some(self.site.base.clone()),
            ["site", "source"] => Some(self.site.source.display().to_string()),
            ["site", "dest"] => Some(self.site.dest.display().to_string()),
            ["server", "port"] => Some(self.server.port.to_string()),
            ["theme", "hostname"] => self.theme.hostname.clone(),
            ["theme", "darkmode"] => Some(self.theme.darkmode.as_str().to_string()),
            ["theme", "author"] => self.theme.author.clone(),
            _ => None,
        }
    }

    /// Normalized base path with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base(&self) -> String {
        normalize_base_url(&self.site.base)
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    if s.is_empty() {
        return "/".to_string();
    }

    if !s.starts_with('/') {
        s.insert(0, '/');
    }
    if !s.ends_with('/') {
        s.push('/');
    }

    while s.contains("//") {
        s = s.replace("//", "/");
    }

    s
}
