//! # notesite-render
//!
//! Template rendering library for notesite.
//!
//! This crate handles HTML template rendering using Askama, plus the
//! recursive chrome fragments (navbar, sidebar, table of contents) that
//! the templates embed.

pub mod comment;
pub mod nav;
pub mod site;
pub mod templates;

use thiserror::Error;

pub use comment::render_comment;
pub use nav::{render_head_tags, render_navbar, render_sidebar, render_toc};
pub use site::{article_route, listing_routes, RenderedPage, SiteRenderer};
pub use templates::{Chrome, ListingTemplate, NotFoundTemplate, PageTemplate};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}
