use serde::Serialize;

use crate::sync::{ImportCounts, SeriesCounts, WatchCounts};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl HealthResponse {
    pub const fn healthy() -> Self {
        Self { status: "healthy" }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub status: &'static str,
    pub imported_count: u32,
    pub updated_count: u32,
}

impl From<ImportCounts> for ImportResponse {
    fn from(counts: ImportCounts) -> Self {
        Self {
            status: "success",
            imported_count: counts.imported,
            updated_count: counts.updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeriesImportResponse {
    pub new_series: u32,
    pub updated_series: u32,
    pub new_episodes: u32,
    pub updated_episodes: u32,
}

impl From<SeriesCounts> for SeriesImportResponse {
    fn from(counts: SeriesCounts) -> Self {
        Self {
            new_series: counts.new_series,
            updated_series: counts.updated_series,
            new_episodes: counts.new_episodes,
            updated_episodes: counts.updated_episodes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WatchSyncResponse {
    pub status: &'static str,
    pub synced_count: u32,
    pub updated_count: u32,
    pub added_count: u32,
}

impl From<WatchCounts> for WatchSyncResponse {
    fn from(counts: WatchCounts) -> Self {
        Self {
            status: "success",
            synced_count: counts.synced,
            updated_count: counts.updated,
            added_count: counts.added,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}
