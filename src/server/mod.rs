//! HTTP server for the HomePantry add-on.
//!
//! # Endpoints
//!
//! All paths below are relative to the ingress base path (see [`crate::ingress`]).
//!
//! - `GET api/{collection}`: list items
//! - `POST api/{collection}`: add an item
//! - `PUT api/{collection}/{id}`: merge fields into an item
//! - `DELETE api/{collection}/{id}`: remove an item
//! - `GET api/backup`: zip of the data file and images
//! - `POST api/upload-image`: multipart image upload
//! - `GET api/images/{filename}`: uploaded image
//! - `GET` (base path itself) and `GET index.html`: `index.html` with the
//!   base path injected
//! - anything else: static files from the www directory (no directory indexes)
//!
//! `GET /health` is always served at the root.

mod api;
mod assets;
mod error;

pub use error::ApiError;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::collections::CollectionService;
use crate::config::Config;
use crate::images::ImageStore;
use crate::ingress::{BasePath, IngressSettings};
use crate::store::JsonStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub collections: Arc<CollectionService>,
    pub images: Arc<ImageStore>,
    pub base_path: BasePath,
    pub www_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, base_path: BasePath) -> Self {
        Self {
            collections: Arc::new(CollectionService::new(JsonStore::new(&config.data_file))),
            images: Arc::new(ImageStore::new(&config.upload_dir)),
            base_path,
            www_dir: config.www_dir.clone(),
        }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the router with every route mounted under the state's base path.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let base = state.base_path.clone();

    let mut app = Router::new()
        .route("/health", get(health))
        .route(&base.route("api/backup"), get(assets::backup))
        .route(
            &base.route("api/upload-image"),
            post(assets::upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(&base.route("api/images/{filename}"), get(assets::image))
        .route(
            &base.route("api/{collection}"),
            get(api::list).post(api::create),
        )
        .route(
            &base.route("api/{collection}/{id}"),
            put(api::update).delete(api::delete),
        )
        .route(base.as_str(), get(assets::index))
        .route(&base.route("index.html"), get(assets::index));

    if !base.is_root() {
        app = app.route(base.as_str().trim_end_matches('/'), get(assets::index));
    }

    app.fallback(assets::static_file)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Resolves the base path and serves until the process is stopped.
pub async fn serve(config: &Config) -> std::io::Result<()> {
    let (base_path, source) = IngressSettings::from_config(config).resolve().await;
    tracing::info!("Ingress base path: {} (from {})", base_path, source);

    let state = AppState::new(config, base_path);
    let app = router(state, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
