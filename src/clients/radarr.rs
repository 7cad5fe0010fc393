use reqwest::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::error::{SyncError, SyncResult};

const SERVICE: &str = "Radarr";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovie {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub status: Option<String>,
    /// Theatrical release timestamp; Radarr sends ISO 8601.
    pub in_cinemas: Option<String>,
}

impl RadarrMovie {
    /// Radarr uses 0 as "no TMDB id", so filter it out before it becomes a
    /// bogus global identifier.
    pub fn tmdb_id_string(&self) -> Option<String> {
        self.tmdb_id.filter(|id| *id > 0).map(|id| id.to_string())
    }

    pub fn imdb_id_string(&self) -> Option<String> {
        self.imdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
    }
}

#[derive(Clone)]
pub struct RadarrClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RadarrClient {
    pub fn new(config: &ServiceConfig) -> SyncResult<Self> {
        let (http, base_url) = super::build_client(SERVICE, config)?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub async fn fetch_movies(&self) -> SyncResult<Vec<RadarrMovie>> {
        let url = format!("{}/api/v3/movie", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::from_reqwest(SERVICE, e))?;

        let response = super::ensure_success(SERVICE, response).await?;
        response
            .json()
            .await
            .map_err(|e| SyncError::from_reqwest(SERVICE, e))
    }
}
