//! HTTP surface.
//!
//! | Route | Serves |
//! |-------|--------|
//! | `GET /` | The gallery, rendered from the current snapshot |
//! | `GET /data/library.json` | The snapshot file, verbatim |
//! | `GET /style.css` | The gallery stylesheet |
//! | `/images/*` | Files under the images directory |
//! | anything else | Files under the assets directory |
//!
//! Every request reads from disk, so a snapshot written by a concurrent sync
//! is visible on the next request without a restart.

use crate::gallery::{self, GalleryQuery, GalleryState};
use crate::snapshot::read_snapshot;
use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use std::io;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const STYLE_CSS: &str = include_str!("../static/style.css");

/// Body of the 404 returned before the first snapshot exists.
pub const NOT_FOUND_MESSAGE: &str = "Library data not found.";

#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot_path: PathBuf,
    pub images_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self {
            snapshot_path: config.snapshot_path(),
            images_dir: config.paths.images_dir.clone(),
            assets_dir: config.paths.assets_dir.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let images = ServeDir::new(&state.images_dir);
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .route("/", get(gallery_page))
        .route("/data/library.json", get(library_data))
        .route("/style.css", get(stylesheet))
        .nest_service(crate::naming::IMAGES_URL_PREFIX, images)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /data/library.json
async fn library_data(State(state): State<AppState>) -> Response {
    match tokio::fs::read(&state.snapshot_path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
        }
        Err(e) => {
            tracing::error!(path = %state.snapshot_path.display(), error = %e, "Cannot read library data");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// GET /
///
/// A missing or unreadable snapshot renders the empty gallery.
async fn gallery_page(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Html<String> {
    let sections = match read_snapshot(&state.snapshot_path).await {
        Ok(Some(sections)) => sections,
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::error!(path = %state.snapshot_path.display(), error = %e, "Cannot load library data");
            Vec::new()
        }
    };

    let gallery_state = GalleryState::from_query(&sections, &query);
    Html(gallery::render_page(&sections, &gallery_state).into_string())
}

/// GET /style.css
async fn stylesheet() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLE_CSS,
    )
        .into_response()
}
