//! HTML fragments for the page chrome: navbar, sidebar, table of contents
//! and custom `<head>` tags.
//!
//! These are rendered in Rust and handed to the templates as pre-built
//! HTML, since they are recursive and askama templates are not.

use notesite_core::models::{is_external, with_base};
use notesite_core::{HeadTag, NavNode, PageHeader};

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &["base", "link", "meta"];

/// Resolve a node link to an `href`: internal routes get the site base
pub fn href(base: &str, link: &str) -> String {
    if is_external(link) || link.starts_with('#') {
        link.to_string()
    } else {
        with_base(base, link)
    }
}

/// Top navigation bar; groups become dropdown menus
pub fn render_navbar(nodes: &[NavNode], base: &str, route: &str) -> String {
    let mut html = String::from("<ul class=\"navbar-links\">");

    for node in nodes {
        if node.is_group() {
            let active = if node.is_active(route) { " active" } else { "" };
            html.push_str(&format!("<li class=\"navbar-item dropdown{}\">", active));
            html.push_str(&nav_link(node, base, route, "dropdown-title"));
            html.push_str(&dropdown_menu(&node.children, base, route));
            html.push_str("</li>");
        } else {
            html.push_str("<li class=\"navbar-item\">");
            html.push_str(&nav_link(node, base, route, "nav-link"));
            html.push_str("</li>");
        }
    }

    html.push_str("</ul>");
    html
}

fn dropdown_menu(nodes: &[NavNode], base: &str, route: &str) -> String {
    let mut html = String::from("<ul class=\"dropdown-menu\">");
    for node in nodes {
        if node.is_group() {
            html.push_str("<li class=\"dropdown-group\">");
            html.push_str(&nav_link(node, base, route, "dropdown-subtitle"));
            html.push_str(&dropdown_menu(&node.children, base, route));
        } else {
            html.push_str("<li>");
            html.push_str(&nav_link(node, base, route, "nav-link"));
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

/// Sidebar tree; collapsible groups become `<details>`, open on the active trail
pub fn render_sidebar(nodes: &[NavNode], base: &str, route: &str) -> String {
    let items: String = nodes
        .iter()
        .map(|node| sidebar_item(node, base, route, 0))
        .collect();
    format!("<ul class=\"sidebar-links\">{}</ul>", items)
}

fn sidebar_item(node: &NavNode, base: &str, route: &str, depth: usize) -> String {
    if !node.is_group() {
        return format!("<li>{}</li>", nav_link(node, base, route, "sidebar-link"));
    }

    let heading = nav_link(node, base, route, "sidebar-heading");
    let children: String = node
        .children
        .iter()
        .map(|child| sidebar_item(child, base, route, depth + 1))
        .collect();

    if node.collapsible {
        let open = if node.is_active(route) { " open" } else { "" };
        format!(
            "<li><details class=\"sidebar-group depth-{}\"{}><summary>{}</summary><ul>{}</ul></details></li>",
            depth, open, heading, children
        )
    } else {
        format!(
            "<li><section class=\"sidebar-group depth-{}\">{}<ul>{}</ul></section></li>",
            depth, heading, children
        )
    }
}

fn nav_link(node: &NavNode, base: &str, route: &str, class: &str) -> String {
    let label = match &node.icon {
        Some(icon) => format!(
            "<i class=\"icon icon-{}\"></i>{}",
            html_escape(icon),
            html_escape(&node.text)
        ),
        None => html_escape(&node.text),
    };

    match &node.link {
        Some(link) if node.is_external() => format!(
            "<a class=\"{} external\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
            class,
            html_escape(link),
            label
        ),
        Some(link) => {
            let current = link.split('#').next() == Some(route);
            format!(
                "<a class=\"{}{}\" href=\"{}\"{}>{}</a>",
                class,
                if current { " active" } else { "" },
                html_escape(&href(base, link)),
                if current { " aria-current=\"page\"" } else { "" },
                label
            )
        }
        None => format!("<span class=\"{}\">{}</span>", class, label),
    }
}

/// Table of contents from a page's header outline, `None` when empty
pub fn render_toc(headers: &[PageHeader]) -> Option<String> {
    if headers.is_empty() {
        return None;
    }
    Some(format!(
        "<nav class=\"toc\"><p class=\"toc-title\">On this page</p>{}</nav>",
        toc_list(headers)
    ))
}

fn toc_list(headers: &[PageHeader]) -> String {
    let mut html = String::from("<ul>");
    for header in headers {
        html.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a>",
            header.level,
            html_escape(&header.slug),
            html_escape(&header.title)
        ));
        if !header.children.is_empty() {
            html.push_str(&toc_list(&header.children));
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
    html
}

/// `site.head` entries as HTML, one per line
pub fn render_head_tags(tags: &[HeadTag]) -> String {
    tags.iter()
        .map(render_head_tag)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_head_tag(tag: &HeadTag) -> String {
    let mut html = format!("<{}", tag.tag);

    for (name, value) in &tag.attrs {
        match value {
            serde_yaml::Value::Bool(true) => html.push_str(&format!(" {}", name)),
            serde_yaml::Value::Bool(false) | serde_yaml::Value::Null => {}
            serde_yaml::Value::String(s) => {
                html.push_str(&format!(" {}=\"{}\"", name, html_escape(s)))
            }
            serde_yaml::Value::Number(n) => html.push_str(&format!(" {}=\"{}\"", name, n)),
            other => tracing::warn!(
                "Ignoring non-scalar attribute '{}' on <{}>: {:?}",
                name,
                tag.tag,
                other
            ),
        }
    }
    html.push('>');

    let is_void = VOID_ELEMENTS.contains(&tag.tag.as_str());
    if is_void && tag.content.is_none() {
        return html;
    }

    // Content is trusted configuration (inline scripts and styles)
    if let Some(content) = &tag.content {
        html.push_str(content);
    }
    html.push_str(&format!("</{}>", tag.tag));
    html
}

/// HTML escape function to prevent XSS
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
