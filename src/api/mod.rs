use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::db::Store;

pub mod error;
pub mod import;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(import::root))
        .route("/health", get(import::health))
        .route("/api/v1/radarr/import", post(import::radarr_import))
        .route("/api/v1/sonarr/import", post(import::sonarr_import))
        .route(
            "/api/v1/jellyfin/import/users",
            post(import::jellyfin_import_users),
        )
        .route(
            "/api/v1/jellyfin/sync/movies",
            post(import::jellyfin_sync_movies),
        )
        .route(
            "/api/v1/jellyfin/import/movies",
            post(import::jellyfin_import_movies),
        )
        .route(
            "/api/v1/jellyfin/import/series",
            post(import::jellyfin_import_series),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.server.cors_allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| warn!("ignoring invalid CORS origin: {origin}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
