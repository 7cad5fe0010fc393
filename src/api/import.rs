use axum::extract::State;
use axum::response::Json;

use crate::api::error::ApiError;
use crate::api::types::{
    HealthResponse, ImportResponse, SeriesImportResponse, WatchSyncResponse,
};
use crate::api::AppState;
use crate::clients::{JellyfinClient, RadarrClient, SonarrClient};
use crate::sync;

pub async fn root() -> &'static str {
    "mediarr is running"
}

pub async fn health(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(crate::error::SyncError::Storage)?;
    Ok(Json(HealthResponse::healthy()))
}

pub async fn radarr_import(
    State(state): State<AppState>,
) -> Result<Json<ImportResponse>, ApiError> {
    let client = RadarrClient::new(&state.config.radarr)?;
    let counts = sync::radarr::import_movies(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}

pub async fn sonarr_import(
    State(state): State<AppState>,
) -> Result<Json<SeriesImportResponse>, ApiError> {
    let client = SonarrClient::new(&state.config.sonarr)?;
    let counts = sync::sonarr::import_series(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}

pub async fn jellyfin_import_users(
    State(state): State<AppState>,
) -> Result<Json<ImportResponse>, ApiError> {
    let client = JellyfinClient::new(&state.config.jellyfin)?;
    let counts = sync::jellyfin::import_users(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}

pub async fn jellyfin_sync_movies(
    State(state): State<AppState>,
) -> Result<Json<WatchSyncResponse>, ApiError> {
    let client = JellyfinClient::new(&state.config.jellyfin)?;
    let counts = sync::jellyfin::sync_watch_state(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}

pub async fn jellyfin_import_movies(
    State(state): State<AppState>,
) -> Result<Json<ImportResponse>, ApiError> {
    let client = JellyfinClient::new(&state.config.jellyfin)?;
    let counts = sync::jellyfin::import_movies(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}

pub async fn jellyfin_import_series(
    State(state): State<AppState>,
) -> Result<Json<SeriesImportResponse>, ApiError> {
    let client = JellyfinClient::new(&state.config.jellyfin)?;
    let counts = sync::jellyfin::import_series(&state.store.conn, &client).await?;
    Ok(Json(counts.into()))
}
