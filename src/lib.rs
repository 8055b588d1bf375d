pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    extract::State,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use services::media::MediaStorage;

// Shared state for every request
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(db: database::Database, config: config::Config) -> Arc<Self> {
        let media = MediaStorage::new(config.media.root.clone(), &config.media.url_prefix);
        Arc::new(Self { db, config, media })
    }
}

/// Builds the full HTTP application for `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/", get(|| async { "Cinema API v1.0" }))
        .route("/health", get(health))
        .nest("/api", controllers::routes(&state))
        .nest_service(state.media.url_prefix(), ServeDir::new(state.media.root()))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if let Some(origin) = state.config.app.cors_allow_origin.as_deref() {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                router = router.layer(
                    CorsLayer::new()
                        .allow_origin(origin)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::PATCH,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
                );
            }
            Err(e) => tracing::warn!(%origin, error = %e, "ignoring invalid CORS origin"),
        }
    }

    router
}

async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("health check failed: {:?}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
