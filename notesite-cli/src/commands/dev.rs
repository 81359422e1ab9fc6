//! Dev server command implementation.

use super::build::{build_site_with_config, search_entries};
use super::search::SearchResults;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use notesite_core::{perform_search, Config, SearchEntry};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Quiet period that coalesces bursts of file events into one rebuild
const DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Clone)]
struct AppState {
    data: Arc<RwLock<SiteData>>,
}

struct SiteData {
    search_entries: Vec<SearchEntry>,
}

/// Where the running router serves from; fixed until restart
#[derive(Debug, Clone)]
struct ServedSite {
    base: String,
    output_dir: PathBuf,
}

impl ServedSite {
    fn new(config: &Config) -> Self {
        let output_dir = config.output_dir();
        Self {
            base: config.normalized_base(),
            output_dir: std::fs::canonicalize(&output_dir).unwrap_or(output_dir),
        }
    }

    /// Events caused by our own writes into the output directory
    fn is_own_output(&self, event: &notify::Event) -> bool {
        !event.paths.is_empty() && event.paths.iter().all(|p| self.in_output(p))
    }

    fn in_output(&self, path: &Path) -> bool {
        if path.starts_with(&self.output_dir) {
            return true;
        }
        // Removed files cannot be canonicalized; their parent usually can
        let parent = path.parent().and_then(|p| std::fs::canonicalize(p).ok());
        match (parent, path.file_name()) {
            (Some(parent), Some(name)) => parent.join(name).starts_with(&self.output_dir),
            _ => false,
        }
    }

    fn moved_by(&self, config: &Config) -> bool {
        ServedSite::new(config).output_dir != self.output_dir
            || config.normalized_base() != self.base
    }
}

/// Start development server with file watching
pub async fn dev_server(config_path: &Path, port: Option<u16>) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let site_data = load_site_data(&config)?;

    // The first build created the output directory, so it canonicalizes
    let served = ServedSite::new(&config);
    let base = served.base.clone();
    let output_dir = served.output_dir.clone();
    let source_dir = config.source_dir();
    let port = port.unwrap_or(config.server.port);
    let shared_data = Arc::new(RwLock::new(site_data));

    // Set up file watching for live rebuilds
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    watcher
        .watch(&source_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", source_dir))?;
    watcher
        .watch(config_path, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {:?}", config_path))?;

    tokio::spawn({
        let data_handle = shared_data.clone();
        let config_path = config_path.to_path_buf();
        async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(ev) if matches!(ev.kind, EventKind::Access(_)) => continue,
                    Ok(ev) if served.is_own_output(&ev) => continue,
                    Ok(_) => {
                        tokio::time::sleep(DEBOUNCE).await;
                        while rx.try_recv().is_ok() {}

                        tracing::info!("Change detected, rebuilding site...");
                        let res = tokio::task::spawn_blocking({
                            let config_path = config_path.clone();
                            let served = served.clone();
                            move || rebuild(&config_path, &served)
                        })
                        .await;

                        match res {
                            Ok(Ok(data)) => {
                                *data_handle.write().await = data;
                                tracing::info!("Rebuild complete");
                            }
                            Ok(Err(e)) => tracing::error!("Rebuild failed: {:?}", e),
                            Err(e) => tracing::error!("Rebuild task panicked: {}", e),
                        }
                    }
                    Err(err) => tracing::warn!("Watcher error: {}", err),
                }
            }
        }
    });

    let state = AppState { data: shared_data };
    let app = router(state, &base, &output_dir).layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Starting dev server on http://{}{}", addr, base);
    println!("\nServing at http://localhost:{}{}", port, base);
    println!("   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    // Watching ends with the server
    drop(watcher);
    Ok(())
}

fn load_site_data(config: &Config) -> Result<SiteData> {
    let site_index = build_site_with_config(config)?;
    Ok(SiteData {
        search_entries: search_entries(&site_index, &config.normalized_base()),
    })
}

/// Reload the config so edits to `notesite.yml` apply without a restart
fn rebuild(config_path: &Path, served: &ServedSite) -> Result<SiteData> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    if served.moved_by(&config) {
        tracing::warn!(
            "site.base or site.dest changed; still serving {:?} under {} until the server restarts",
            served.output_dir,
            served.base
        );
    }
    load_site_data(&config)
}

/// Static files from the output directory under `base`, plus the JSON API
fn router(state: AppState, base: &str, output_dir: &Path) -> Router {
    let files = ServeDir::new(output_dir)
        .not_found_service(ServeFile::new(output_dir.join("404.html")));

    let api = Router::new()
        .route("/api/search", get(api_search))
        .with_state(state);

    if base == "/" {
        api.fallback_service(files)
    } else {
        let target = base.to_string();
        api.route(
            "/",
            get(move || {
                let target = target.clone();
                async move { Redirect::temporary(&target) }
            }),
        )
        .nest_service(base.trim_end_matches('/'), files)
    }
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    limit: Option<usize>,
}

async fn api_search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing query ?q=").into_response();
    }

    let limit = params.limit.unwrap_or(10);
    let data = state.data.read().await;
    let hits = perform_search(&data.search_entries, &query, limit);

    Json(SearchResults::new(&query, hits)).into_response()
}
