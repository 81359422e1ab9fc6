//! Theme options: presentation, navigation trees and plugin settings.

use crate::models::{Diagnostic, DiagnosticSeverity};
use crate::navigation::{NavItem, SidebarConfig};
use serde::de::value::MapAccessDeserializer;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The `theme:` section of `notesite.yml`.
///
/// Keys are authored in camelCase (`displayFooter`, `mdEnhance`, ...).
/// Anything the struct does not name ends up in
/// [`Config::unknown_keys`](crate::Config::unknown_keys).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    /// Canonical domain, e.g. `https://notes.example.com`
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub logo: Option<String>,

    /// Repository link shown in the navbar
    #[serde(default)]
    pub repo: Option<String>,

    #[serde(default)]
    pub darkmode: DarkMode,

    /// Named palette entries, emitted as `--theme-<name>` CSS variables
    #[serde(default)]
    pub theme_color: BTreeMap<String, String>,

    #[serde(default)]
    pub footer: Option<String>,

    #[serde(default)]
    pub copyright: Option<String>,

    #[serde(default)]
    pub display_footer: bool,

    /// Deepest heading level (below h1) collected into the page outline
    #[serde(default = "default_header_depth")]
    pub header_depth: u8,

    #[serde(default)]
    pub navbar: Vec<NavItem>,

    #[serde(default)]
    pub sidebar: SidebarConfig,

    #[serde(default)]
    pub plugins: PluginsConfig,
}

fn default_header_depth() -> u8 {
    2
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            author: None,
            logo: None,
            repo: None,
            darkmode: DarkMode::default(),
            theme_color: BTreeMap::new(),
            footer: None,
            copyright: None,
            display_footer: false,
            header_depth: default_header_depth(),
            navbar: Vec::new(),
            sidebar: SidebarConfig::default(),
            plugins: PluginsConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Light/dark behaviour of the rendered site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    /// Switch between light, dark and auto
    Switch,
    /// Toggle between light and dark
    Toggle,
    /// Follow the operating system preference
    #[default]
    Auto,
    /// Always dark
    Enable,
    /// Always light
    Disable,
}

impl DarkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DarkMode::Switch => "switch",
            DarkMode::Toggle => "toggle",
            DarkMode::Auto => "auto",
            DarkMode::Enable => "enable",
            DarkMode::Disable => "disable",
        }
    }

    /// Whether the page shows a user-facing toggle button
    pub fn has_toggle(&self) -> bool {
        matches!(self, DarkMode::Switch | DarkMode::Toggle)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginsConfig {
    #[serde(default)]
    pub blog: BlogOption,

    #[serde(default)]
    pub comment: Option<CommentConfig>,

    #[serde(default)]
    pub md_enhance: MdEnhanceConfig,

    #[serde(default = "default_true")]
    pub search: bool,

    /// Defaults to on whenever `hostname` is set
    #[serde(default)]
    pub sitemap: Option<bool>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            blog: BlogOption::default(),
            comment: None,
            md_enhance: MdEnhanceConfig::default(),
            search: true,
            sitemap: None,
        }
    }
}

/// `blog: true` or `blog: { articlePerPage: 10 }`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BlogOption {
    Enabled(bool),
    Options(BlogOptions),
}

impl<'de> Deserialize<'de> for BlogOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BlogOptionVisitor;

        impl<'de> Visitor<'de> for BlogOptionVisitor {
            type Value = BlogOption;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or a map of blog options")
            }

            fn visit_bool<E>(self, value: bool) -> Result<BlogOption, E>
            where
                E: de::Error,
            {
                Ok(BlogOption::Enabled(value))
            }

            // Options go through the derived impl so unknown keys are reported
            fn visit_map<M>(self, map: M) -> Result<BlogOption, M::Error>
            where
                M: MapAccess<'de>,
            {
                BlogOptions::deserialize(MapAccessDeserializer::new(map)).map(BlogOption::Options)
            }
        }

        deserializer.deserialize_any(BlogOptionVisitor)
    }
}

impl Default for BlogOption {
    fn default() -> Self {
        BlogOption::Enabled(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogOptions {
    #[serde(default = "default_article_per_page")]
    pub article_per_page: usize,
}

fn default_article_per_page() -> usize {
    10
}

impl BlogOption {
    pub fn enabled(&self) -> bool {
        match self {
            BlogOption::Enabled(on) => *on,
            BlogOption::Options(_) => true,
        }
    }

    pub fn article_per_page(&self) -> usize {
        match self {
            BlogOption::Options(opts) if opts.article_per_page > 0 => opts.article_per_page,
            _ => default_article_per_page(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentProvider {
    Giscus,
    Waline,
    Twikoo,
    Artalk,
}

impl CommentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentProvider::Giscus => "giscus",
            CommentProvider::Waline => "waline",
            CommentProvider::Twikoo => "twikoo",
            CommentProvider::Artalk => "artalk",
        }
    }
}

/// Comment widget settings: a provider plus its credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConfig {
    pub provider: CommentProvider,

    // giscus
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub repo_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub mapping: Option<String>,

    // waline / artalk
    #[serde(default, rename = "serverURL")]
    pub server_url: Option<String>,

    // twikoo
    #[serde(default)]
    pub env_id: Option<String>,
}

impl CommentConfig {
    /// Credential keys the provider cannot work without, as authored
    fn required(&self) -> Vec<(&'static str, &Option<String>)> {
        match self.provider {
            CommentProvider::Giscus => vec![
                ("repo", &self.repo),
                ("repoId", &self.repo_id),
                ("category", &self.category),
                ("categoryId", &self.category_id),
            ],
            CommentProvider::Waline | CommentProvider::Artalk => {
                vec![("serverURL", &self.server_url)]
            }
            CommentProvider::Twikoo => vec![("envId", &self.env_id)],
        }
    }

    /// Names of required credentials that are absent or blank
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        self.required()
            .into_iter()
            .filter(|(_, value)| value.as_deref().map(str::trim).unwrap_or("").is_empty())
            .map(|(key, _)| key)
            .collect()
    }
}

/// Markdown extensions switched on under `plugins.mdEnhance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MdEnhanceConfig {
    /// Tables and strikethrough
    #[serde(default = "default_true")]
    pub gfm: bool,
    #[serde(default)]
    pub tasklist: bool,
    #[serde(default)]
    pub footnote: bool,
    #[serde(default)]
    pub sup: bool,
    #[serde(default)]
    pub sub: bool,
    #[serde(default)]
    pub deflist: bool,
    /// `# Heading {#custom-id .class}`
    #[serde(default)]
    pub heading_attrs: bool,
}

impl Default for MdEnhanceConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            tasklist: false,
            footnote: false,
            sup: false,
            sub: false,
            deflist: false,
            heading_attrs: false,
        }
    }
}

impl ThemeConfig {
    /// Sitemaps need absolute URLs, so no hostname means no sitemap
    pub fn sitemap_enabled(&self) -> bool {
        self.hostname.is_some() && self.plugins.sitemap.unwrap_or(true)
    }

    /// Problems that are valid YAML but unusable settings
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(comment) = &self.plugins.comment {
            for key in comment.missing_credentials() {
                diagnostics.push(
                    Diagnostic::new(
                        "comment.missing-credential",
                        DiagnosticSeverity::Error,
                        format!(
                            "Comment provider '{}' requires '{}'",
                            comment.provider.as_str(),
                            key
                        ),
                    )
                    .with_context(format!("theme.plugins.comment.{}", key)),
                );
            }
        }

        if self.plugins.sitemap == Some(true) && self.hostname.is_none() {
            diagnostics.push(Diagnostic::new(
                "config.sitemap-without-hostname",
                DiagnosticSeverity::Warning,
                "Sitemap is enabled but theme.hostname is not set; it will be skipped",
            ));
        }

        if self.header_depth > 5 {
            diagnostics.push(Diagnostic::new(
                "config.header-depth",
                DiagnosticSeverity::Warning,
                format!(
                    "headerDepth {} exceeds the deepest heading level; using 5",
                    self.header_depth
                ),
            ));
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let theme: ThemeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(theme.darkmode, DarkMode::Auto);
        assert_eq!(theme.header_depth, 2);
        assert!(theme.plugins.search);
        assert!(!theme.plugins.blog.enabled());
        assert!(theme.plugins.md_enhance.gfm);
        assert!(!theme.sitemap_enabled());
    }

    #[test]
    fn test_camel_case_keys() {
        let yaml = r##"
hostname: https://notes.example.com
darkmode: switch
displayFooter: true
headerDepth: 3
themeColor:
  blue: "#2196f3"
plugins:
  blog:
    articlePerPage: 5
  mdEnhance:
    tasklist: true
    headingAttrs: true
"##;
        let theme: ThemeConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(theme.darkmode.has_toggle());
        assert!(theme.display_footer);
        assert_eq!(theme.header_depth, 3);
        assert_eq!(theme.theme_color.get("blue").map(String::as_str), Some("#2196f3"));
        assert!(theme.plugins.blog.enabled());
        assert_eq!(theme.plugins.blog.article_per_page(), 5);
        assert!(theme.plugins.md_enhance.tasklist);
        assert!(theme.plugins.md_enhance.heading_attrs);
        assert!(theme.sitemap_enabled());
    }

    #[test]
    fn test_blog_bool_form() {
        let theme: ThemeConfig = serde_yaml::from_str("plugins:\n  blog: true\n").unwrap();
        assert!(theme.plugins.blog.enabled());
        assert_eq!(theme.plugins.blog.article_per_page(), 10);
    }

    #[test]
    fn test_invalid_darkmode_rejected() {
        assert!(serde_yaml::from_str::<ThemeConfig>("darkmode: sometimes").is_err());
    }

    #[test]
    fn test_giscus_missing_credentials() {
        let yaml = r#"
plugins:
  comment:
    provider: giscus
    repo: me/notes
    category: Announcements
"#;
        let theme: ThemeConfig = serde_yaml::from_str(yaml).unwrap();
        let comment = theme.plugins.comment.as_ref().unwrap();
        assert_eq!(comment.missing_credentials(), vec!["repoId", "categoryId"]);

        let diags = theme.diagnostics();
        assert_eq!(diags.len(), 2);
        assert!(diags
            .iter()
            .all(|d| d.code == "comment.missing-credential"
                && d.severity == DiagnosticSeverity::Error));
    }

    #[test]
    fn test_waline_server_url() {
        let yaml = "plugins:\n  comment:\n    provider: waline\n    serverURL: https://comments.example.com\n";
        let theme: ThemeConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(theme.diagnostics().is_empty());
    }

    #[test]
    fn test_explicit_sitemap_without_hostname_warns() {
        let theme: ThemeConfig = serde_yaml::from_str("plugins:\n  sitemap: true\n").unwrap();
        let diags = theme.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, DiagnosticSeverity::Warning);
        assert!(!theme.sitemap_enabled());
    }
}
