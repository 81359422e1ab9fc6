//! Comment widget embeds for the supported third-party providers.

use crate::nav::html_escape;
use notesite_core::{CommentConfig, CommentProvider};

/// Embed markup for `config` on the page at `path`.
///
/// Returns `None` when the provider is missing a required credential;
/// `verify` reports those as `comment.missing-credential`.
pub fn render_comment(config: &CommentConfig, path: &str) -> Option<String> {
    if !config.missing_credentials().is_empty() {
        return None;
    }

    let html = match config.provider {
        CommentProvider::Giscus => {
            let attr = |v: &Option<String>| html_escape(v.as_deref().unwrap_or_default());
            format!(
                concat!(
                    "<script src=\"https://giscus.app/client.js\" data-repo=\"{}\" data-repo-id=\"{}\" ",
                    "data-category=\"{}\" data-category-id=\"{}\" data-mapping=\"{}\" ",
                    "data-reactions-enabled=\"1\" data-theme=\"preferred_color_scheme\" ",
                    "crossorigin=\"anonymous\" async></script>"
                ),
                attr(&config.repo),
                attr(&config.repo_id),
                attr(&config.category),
                attr(&config.category_id),
                html_escape(config.mapping.as_deref().unwrap_or("pathname")),
            )
        }
        CommentProvider::Waline => format!(
            concat!(
                "<div id=\"waline\"></div>",
                "<link rel=\"stylesheet\" href=\"https://unpkg.com/@waline/client@v3/dist/waline.css\">",
                "<script type=\"module\">import {{ init }} from 'https://unpkg.com/@waline/client@v3/dist/waline.js';",
                "init({{ el: '#waline', serverURL: {}, path: {} }});</script>"
            ),
            js_string(config.server_url.as_deref().unwrap_or_default()),
            js_string(path),
        ),
        CommentProvider::Twikoo => format!(
            concat!(
                "<div id=\"tcomment\"></div>",
                "<script src=\"https://cdn.jsdelivr.net/npm/twikoo@1.6.41/dist/twikoo.all.min.js\"></script>",
                "<script>twikoo.init({{ envId: {}, el: '#tcomment', path: {} }});</script>"
            ),
            js_string(config.env_id.as_deref().unwrap_or_default()),
            js_string(path),
        ),
        CommentProvider::Artalk => {
            let server = config
                .server_url
                .as_deref()
                .unwrap_or_default()
                .trim_end_matches('/');
            format!(
                concat!(
                    "<div id=\"artalk\"></div>",
                    "<link rel=\"stylesheet\" href=\"{server}/dist/Artalk.css\">",
                    "<script src=\"{server}/dist/Artalk.js\"></script>",
                    "<script>Artalk.init({{ el: '#artalk', pageKey: {path}, server: {server_js} }});</script>"
                ),
                server = html_escape(server),
                path = js_string(path),
                server_js = js_string(server),
            )
        }
    };

    Some(html)
}

/// A JavaScript string literal that is safe inside a `<script>` element
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: CommentProvider) -> CommentConfig {
        CommentConfig {
            provider,
            repo: None,
            repo_id: None,
            category: None,
            category_id: None,
            mapping: None,
            server_url: None,
            env_id: None,
        }
    }

    #[test]
    fn test_giscus_embed() {
        let mut cfg = config(CommentProvider::Giscus);
        cfg.repo = Some("me/notes".into());
        cfg.repo_id = Some("R_1".into());
        cfg.category = Some("Announcements".into());
        cfg.category_id = Some("DIC_1".into());

        let html = render_comment(&cfg, "/react/react.html").unwrap();
        assert!(html.contains("data-repo=\"me/notes\""));
        assert!(html.contains("data-category-id=\"DIC_1\""));
        assert!(html.contains("data-mapping=\"pathname\""));
    }

    #[test]
    fn test_missing_credentials_render_nothing() {
        let mut cfg = config(CommentProvider::Giscus);
        cfg.repo = Some("me/notes".into());
        assert!(render_comment(&cfg, "/").is_none());
        assert!(render_comment(&config(CommentProvider::Twikoo), "/").is_none());
    }

    #[test]
    fn test_waline_embed_quotes_values() {
        let mut cfg = config(CommentProvider::Waline);
        cfg.server_url = Some("https://comments.example.com".into());
        let html = render_comment(&cfg, "/a'b</script>").unwrap();
        assert!(html.contains("serverURL: \"https://comments.example.com\""));
        assert!(html.contains("path: \"/a'b<\\/script>\""));
    }

    #[test]
    fn test_artalk_embed() {
        let mut cfg = config(CommentProvider::Artalk);
        cfg.server_url = Some("https://artalk.example.com/".into());
        let html = render_comment(&cfg, "/").unwrap();
        assert!(html.contains("href=\"https://artalk.example.com/dist/Artalk.css\""));
        assert!(html.contains("server: \"https://artalk.example.com\""));
    }
}
