//! Code syntax highlighting using syntect.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        theme_set
            .themes
            .get("InspiredGitHub")
            .or_else(|| theme_set.themes.get("base16-ocean.light"))
            .cloned()
            .unwrap_or_default()
    })
}

/// Replaces fenced code blocks with syntect-highlighted HTML
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut result = Vec::with_capacity(events.len());
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    // Info strings may carry extras after the language: "js {1,3}"
                    let lang = info.split_whitespace().next().unwrap_or("").to_string();
                    code_lang = Some(lang);
                    code_content.clear();
                }
                Event::Text(text) if code_lang.is_some() => {
                    code_content.push_str(&text);
                }
                Event::End(TagEnd::CodeBlock) if code_lang.is_some() => {
                    let lang = code_lang.take().unwrap_or_default();
                    let html = self.render_block(&code_content, &lang);
                    result.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                }
                other => result.push(other),
            }
        }

        result
    }

    fn render_block(&self, code: &str, lang: &str) -> String {
        if lang.is_empty() {
            return format!(
                "<div class=\"language-text\"><pre><code>{}</code></pre></div>\n",
                html_escape(code)
            );
        }

        let ss = syntax_set();
        let syntax = ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_extension(lang))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let inner = match highlighted_html_for_string(code, ss, syntax, theme()) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Highlighting '{}' block failed: {}", lang, e);
                format!("<pre><code>{}</code></pre>", html_escape(code))
            }
        };

        format!(
            "<div class=\"language-{lang}\" data-lang=\"{lang}\">{inner}</div>\n",
            lang = html_escape(lang),
            inner = inner
        )
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
