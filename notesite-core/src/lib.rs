//! # notesite-core
//!
//! Core library for the notesite static site generator.
//!
//! This crate reads the site configuration and the Markdown content,
//! builds the page model and navigation trees, and reports everything
//! that looks wrong as [`Diagnostic`]s. Rendering to HTML files lives in
//! `notesite-render`.

pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod metrics;
pub mod models;
pub mod navigation;
pub mod search;
pub mod slug;
pub mod theme;

pub use builder::{BuildError, SiteBuilder};
pub use config::{Config, ConfigError, HeadTag};
pub use models::{Diagnostic, DiagnosticSeverity, Frontmatter, Page, PageHeader, SiteIndex};
pub use navigation::{NavItem, NavNode, ResolvedSidebar};
pub use search::{build_search_index, perform_search, SearchEntry};
pub use slug::{slugify, SlugDeduper};
pub use theme::{CommentConfig, CommentProvider, DarkMode, ThemeConfig};
