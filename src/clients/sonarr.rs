use reqwest::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::error::{SyncError, SyncResult};

const SERVICE: &str = "Sonarr";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeries {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    pub status: Option<String>,
    pub year: Option<i32>,
    pub tvdb_id: Option<i64>,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub first_aired: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub ratings: Option<SonarrRatings>,
    #[serde(default)]
    pub images: Vec<SonarrImage>,
    #[serde(default)]
    pub seasons: Vec<SonarrSeason>,
}

impl SonarrSeries {
    pub fn tvdb_id_string(&self) -> Option<String> {
        self.tvdb_id.filter(|id| *id > 0).map(|id| id.to_string())
    }

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

    pub fn poster_url(&self) -> Option<String> {
        self.images
            .iter()
            .find(|image| image.cover_type.as_deref() == Some("poster"))
            .and_then(|image| image.remote_url.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SonarrRatings {
    pub value: Option<f64>,
    pub votes: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrImage {
    pub cover_type: Option<String>,
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeason {
    pub season_number: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisode {
    pub id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub air_date_utc: Option<String>,
    pub overview: Option<String>,
}

#[derive(Clone)]
pub struct SonarrClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SonarrClient {
    pub fn new(config: &ServiceConfig) -> SyncResult<Self> {
        let (http, base_url) = super::build_client(SERVICE, config)?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    pub async fn fetch_series(&self) -> SyncResult<Vec<SonarrSeries>> {
        let url = format!("{}/api/v3/series", self.base_url);
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

    pub async fn fetch_episodes(&self, series_id: i32) -> SyncResult<Vec<SonarrEpisode>> {
        let url = format!("{}/api/v3/episode", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("seriesId", series_id.to_string())])
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
