//! Navbar and sidebar trees.
//!
//! Trees are authored in `theme.navbar` / `theme.sidebar` as [`NavItem`]s and
//! resolved against the built pages into [`NavNode`]s. Resolution joins
//! relative links onto their group prefix, fills in missing labels from page
//! titles, expands `children: structure` groups from the content layout and
//! reports every structural problem as a [`Diagnostic`]:
//!
//! - `nav.broken-link`: an internal link that no page answers to
//! - `nav.duplicate`: two siblings pointing at the same target
//! - `nav.cycle`: a node linking back to one of its ancestors
//! - `nav.too-deep`: nesting beyond [`MAX_DEPTH`]
//! - `nav.empty-group`: a group with neither a link nor children
//! - `nav.invalid-children`: a `children:` keyword other than `structure`

use crate::models::{is_external, link_key, Diagnostic, DiagnosticSeverity, Page, SiteIndex};
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Deepest nesting accepted in a navigation tree
pub const MAX_DEPTH: usize = 6;

/// Keyword that asks for children generated from the content directory
pub const STRUCTURE: &str = "structure";

/// A navigation entry as authored: a bare link or a full entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NavItem {
    Link(String),
    Entry(NavEntry),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavEntry {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    /// Joined in front of relative child links
    #[serde(default)]
    pub prefix: Option<String>,

    #[serde(default)]
    pub children: Option<NavChildren>,

    #[serde(default)]
    pub collapsible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NavChildren {
    Items(Vec<NavItem>),
    Keyword(String),
}

/// `sidebar:` is either one list for the whole site or a map keyed by
/// URL prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SidebarConfig {
    Single(Vec<NavItem>),
    ByPrefix(BTreeMap<String, Vec<NavItem>>),
}

// The shapes below are told apart by value type. Map forms are handed to the
// derived impls through `MapAccessDeserializer`, so unknown keys inside an
// entry still reach `Config::unknown_keys`.

impl<'de> Deserialize<'de> for NavItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NavItemVisitor;

        impl<'de> Visitor<'de> for NavItemVisitor {
            type Value = NavItem;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a link or a navigation entry")
            }

            fn visit_str<E>(self, value: &str) -> Result<NavItem, E>
            where
                E: de::Error,
            {
                Ok(NavItem::Link(value.to_string()))
            }

            fn visit_map<M>(self, map: M) -> Result<NavItem, M::Error>
            where
                M: MapAccess<'de>,
            {
                NavEntry::deserialize(MapAccessDeserializer::new(map)).map(NavItem::Entry)
            }
        }

        deserializer.deserialize_any(NavItemVisitor)
    }
}

impl<'de> Deserialize<'de> for NavChildren {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NavChildrenVisitor;

        impl<'de> Visitor<'de> for NavChildrenVisitor {
            type Value = NavChildren;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of navigation entries or a keyword")
            }

            fn visit_str<E>(self, value: &str) -> Result<NavChildren, E>
            where
                E: de::Error,
            {
                Ok(NavChildren::Keyword(value.to_string()))
            }

            fn visit_seq<S>(self, seq: S) -> Result<NavChildren, S::Error>
            where
                S: SeqAccess<'de>,
            {
                Vec::deserialize(SeqAccessDeserializer::new(seq)).map(NavChildren::Items)
            }
        }

        deserializer.deserialize_any(NavChildrenVisitor)
    }
}

impl<'de> Deserialize<'de> for SidebarConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SidebarVisitor;

        impl<'de> Visitor<'de> for SidebarVisitor {
            type Value = SidebarConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a list of navigation entries or a map of prefixes")
            }

            fn visit_unit<E>(self) -> Result<SidebarConfig, E>
            where
                E: de::Error,
            {
                Ok(SidebarConfig::default())
            }

            fn visit_seq<S>(self, seq: S) -> Result<SidebarConfig, S::Error>
            where
                S: SeqAccess<'de>,
            {
                Vec::deserialize(SeqAccessDeserializer::new(seq)).map(SidebarConfig::Single)
            }

            fn visit_map<M>(self, map: M) -> Result<SidebarConfig, M::Error>
            where
                M: MapAccess<'de>,
            {
                BTreeMap::deserialize(MapAccessDeserializer::new(map)).map(SidebarConfig::ByPrefix)
            }
        }

        deserializer.deserialize_any(SidebarVisitor)
    }
}

impl Default for SidebarConfig {
    fn default() -> Self {
        SidebarConfig::ByPrefix(BTreeMap::new())
    }
}

impl SidebarConfig {
    /// Prefix/item pairs, normalized to `/prefix/` form
    pub fn groups(&self) -> Vec<(String, &[NavItem])> {
        match self {
            SidebarConfig::Single(items) => vec![("/".to_string(), items.as_slice())],
            SidebarConfig::ByPrefix(map) => map
                .iter()
                .map(|(prefix, items)| (normalize_prefix(prefix), items.as_slice()))
                .collect(),
        }
    }
}

/// A resolved navigation node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    pub text: String,

    #[serde(default)]
    pub icon: Option<String>,

    /// Page route for internal targets, the link as written otherwise
    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub children: Vec<NavNode>,

    #[serde(default)]
    pub collapsible: bool,
}

impl NavNode {
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_external(&self) -> bool {
        self.link.as_deref().map(is_external).unwrap_or(false)
    }

    /// The node or one of its descendants points at `route`
    pub fn is_active(&self, route: &str) -> bool {
        let own = self
            .link
            .as_deref()
            .map(|link| link.split('#').next() == Some(route))
            .unwrap_or(false);
        own || self.children.iter().any(|c| c.is_active(route))
    }
}

/// Sidebars keyed by normalized prefix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedSidebar {
    pub groups: BTreeMap<String, Vec<NavNode>>,
}

impl ResolvedSidebar {
    /// The sidebar with the longest prefix that `route` falls under
    pub fn for_route(&self, route: &str) -> Option<&[NavNode]> {
        self.groups
            .iter()
            .filter(|(prefix, _)| route.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, nodes)| nodes.as_slice())
    }
}

/// Resolve the navbar against the built pages
pub fn resolve_navbar(items: &[NavItem], index: &SiteIndex) -> (Vec<NavNode>, Vec<Diagnostic>) {
    let mut resolver = Resolver::new(index, "navbar".to_string());
    let nodes = resolver.resolve_list(items, "/", &mut Vec::new(), 0);
    (nodes, resolver.diagnostics)
}

/// Resolve every sidebar group against the built pages
pub fn resolve_sidebar(
    config: &SidebarConfig,
    index: &SiteIndex,
) -> (ResolvedSidebar, Vec<Diagnostic>) {
    let mut sidebar = ResolvedSidebar::default();
    let mut diagnostics = Vec::new();

    for (prefix, items) in config.groups() {
        let mut resolver = Resolver::new(index, format!("sidebar[{}]", prefix));
        let nodes = resolver.resolve_list(items, &prefix, &mut Vec::new(), 0);
        diagnostics.append(&mut resolver.diagnostics);
        sidebar.groups.insert(prefix, nodes);
    }

    (sidebar, diagnostics)
}

struct Resolver<'a> {
    index: &'a SiteIndex,
    area: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    fn new(index: &'a SiteIndex, area: String) -> Self {
        Self {
            index,
            area,
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, code: &str, severity: DiagnosticSeverity, message: String, at: &str) {
        self.diagnostics.push(
            Diagnostic::new(code, severity, message)
                .with_context(format!("{} > {}", self.area, at)),
        );
    }

    fn resolve_list(
        &mut self,
        items: &[NavItem],
        prefix: &str,
        ancestors: &mut Vec<String>,
        depth: usize,
    ) -> Vec<NavNode> {
        let mut siblings: HashSet<String> = HashSet::new();
        let mut nodes = Vec::with_capacity(items.len());

        for item in items {
            let Some(node) = self.resolve_item(item, prefix, ancestors, depth) else {
                continue;
            };

            let identity = match &node.link {
                Some(link) if is_external(link) => link.clone(),
                Some(link) => link_key(link),
                None => format!("group:{}", node.text),
            };
            if !siblings.insert(identity.clone()) {
                self.report(
                    "nav.duplicate",
                    DiagnosticSeverity::Error,
                    format!("'{}' appears more than once in the same list", identity),
                    &node.text,
                );
                continue;
            }

            nodes.push(node);
        }

        nodes
    }

    fn resolve_item(
        &mut self,
        item: &NavItem,
        prefix: &str,
        ancestors: &mut Vec<String>,
        depth: usize,
    ) -> Option<NavNode> {
        match item {
            NavItem::Link(raw) => {
                let link = join_link(prefix, raw);
                if ancestors.contains(&link_key(&link)) && !is_external(&link) {
                    self.report(
                        "nav.cycle",
                        DiagnosticSeverity::Error,
                        format!("'{}' links back to an enclosing group", link),
                        raw,
                    );
                    return None;
                }
                Some(self.leaf(None, None, &link, raw))
            }
            NavItem::Entry(entry) => self.resolve_entry(entry, prefix, ancestors, depth),
        }
    }

    fn resolve_entry(
        &mut self,
        entry: &NavEntry,
        prefix: &str,
        ancestors: &mut Vec<String>,
        depth: usize,
    ) -> Option<NavNode> {
        let label = entry
            .text
            .clone()
            .or_else(|| entry.link.clone())
            .unwrap_or_default();

        let link = entry.link.as_deref().map(|l| join_link(prefix, l));
        let child_prefix = match &entry.prefix {
            Some(p) => normalize_prefix(&join_link(prefix, p)),
            None => prefix.to_string(),
        };

        if let Some(link) = &link {
            if !is_external(link) && ancestors.contains(&link_key(link)) {
                self.report(
                    "nav.cycle",
                    DiagnosticSeverity::Error,
                    format!("'{}' links back to an enclosing group", link),
                    &label,
                );
                return None;
            }
        }

        let Some(children) = &entry.children else {
            return match &link {
                Some(link) => Some(self.leaf(entry.text.clone(), entry.icon.clone(), link, &label)),
                None => {
                    self.report(
                        "nav.empty-group",
                        DiagnosticSeverity::Warning,
                        "Entry has neither a link nor children".to_string(),
                        &label,
                    );
                    None
                }
            };
        };

        if depth + 1 >= MAX_DEPTH {
            self.report(
                "nav.too-deep",
                DiagnosticSeverity::Error,
                format!("Navigation nests deeper than {} levels", MAX_DEPTH),
                &label,
            );
            return None;
        }

        let mut group = match &link {
            Some(link) => self.leaf(entry.text.clone(), entry.icon.clone(), link, &label),
            None => NavNode {
                text: label.clone(),
                icon: entry.icon.clone(),
                link: None,
                children: Vec::new(),
                collapsible: false,
            },
        };
        group.collapsible = entry.collapsible;

        let pushed = match &link {
            Some(link) if !is_external(link) => {
                ancestors.push(link_key(link));
                true
            }
            _ => false,
        };

        group.children = match children {
            NavChildren::Items(items) => self.resolve_list(items, &child_prefix, ancestors, depth + 1),
            NavChildren::Keyword(word) if word == STRUCTURE => {
                structure_nodes(self.index, &child_prefix, depth + 1)
            }
            NavChildren::Keyword(word) => {
                self.report(
                    "nav.invalid-children",
                    DiagnosticSeverity::Error,
                    format!("Unknown children keyword '{}' (expected '{}')", word, STRUCTURE),
                    &label,
                );
                Vec::new()
            }
        };

        if pushed {
            ancestors.pop();
        }

        if group.children.is_empty() && group.link.is_none() {
            self.report(
                "nav.empty-group",
                DiagnosticSeverity::Warning,
                "Group has no children".to_string(),
                &label,
            );
            return None;
        }

        Some(group)
    }

    /// A linking node; internal targets are checked against the pages
    fn leaf(&mut self, text: Option<String>, icon: Option<String>, link: &str, at: &str) -> NavNode {
        if is_external(link) {
            return NavNode {
                text: text.unwrap_or_else(|| link.to_string()),
                icon,
                link: Some(link.to_string()),
                children: Vec::new(),
                collapsible: false,
            };
        }

        match self.index.find_by_link(link) {
            Some(page) if !page.is_draft() => {
                let fragment = link.find('#').map(|i| &link[i..]).unwrap_or("");
                NavNode {
                    text: text.unwrap_or_else(|| page.title.clone()),
                    icon: icon.or_else(|| page.frontmatter.icon.clone()),
                    link: Some(format!("{}{}", page.route, fragment)),
                    children: Vec::new(),
                    collapsible: false,
                }
            }
            found => {
                let reason = if found.is_some() {
                    "points at a draft page"
                } else {
                    "does not resolve to any page"
                };
                self.report(
                    "nav.broken-link",
                    DiagnosticSeverity::Error,
                    format!("Link '{}' {}", link, reason),
                    at,
                );
                NavNode {
                    text: text.unwrap_or_else(|| link.to_string()),
                    icon,
                    link: Some(link.to_string()),
                    children: Vec::new(),
                    collapsible: false,
                }
            }
        }
    }
}

/// Children generated from the pages under `prefix`: files first (by
/// `order`, then title), then one group per subdirectory.
fn structure_nodes(index: &SiteIndex, prefix: &str, depth: usize) -> Vec<NavNode> {
    let mut files: Vec<&Page> = Vec::new();
    let mut dirs: BTreeMap<String, Option<&Page>> = BTreeMap::new();

    for page in index.published() {
        let Some(rest) = page.route.strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        match rest.find('/') {
            None => files.push(page),
            Some(pos) => {
                let dir = format!("{}{}/", prefix, &rest[..pos]);
                let entry = dirs.entry(dir.clone()).or_insert(None);
                if page.route == dir {
                    *entry = Some(page);
                }
            }
        }
    }

    files.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

    let mut nodes: Vec<NavNode> = files
        .into_iter()
        .map(|page| NavNode {
            text: page.title.clone(),
            icon: page.frontmatter.icon.clone(),
            link: Some(page.route.clone()),
            children: Vec::new(),
            collapsible: false,
        })
        .collect();

    if depth + 1 >= MAX_DEPTH {
        return nodes;
    }

    for (dir, readme) in dirs {
        let children = structure_nodes(index, &dir, depth + 1);
        let name = dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        if children.is_empty() && readme.is_none() {
            continue;
        }
        nodes.push(NavNode {
            text: readme.map(|p| p.title.clone()).unwrap_or(name),
            icon: readme.and_then(|p| p.frontmatter.icon.clone()),
            link: readme.map(|p| p.route.clone()),
            children,
            collapsible: true,
        });
    }

    nodes
}

fn sort_key(page: &Page) -> (i64, String) {
    (page.frontmatter.order.unwrap_or(i64::MAX), page.title.to_lowercase())
}

/// Join a possibly relative link onto a prefix
///
/// ```
/// use notesite_core::navigation::join_link;
///
/// assert_eq!(join_link("/react/", "hooks"), "/react/hooks");
/// assert_eq!(join_link("/react/", "/vue/"), "/vue/");
/// assert_eq!(join_link("/", "https://github.com"), "https://github.com");
/// ```
pub fn join_link(prefix: &str, link: &str) -> String {
    let link = link.trim();
    if link.starts_with('/') || is_external(link) {
        return link.to_string();
    }
    format!("{}{}", normalize_prefix(prefix), link)
}

/// Ensure a prefix has a leading and trailing slash
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}
