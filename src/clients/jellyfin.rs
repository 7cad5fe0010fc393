use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::ServiceConfig;
use crate::error::{SyncError, SyncResult};

const SERVICE: &str = "Jellyfin";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinUserData {
    #[serde(default)]
    pub played: bool,
    pub last_played_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinItem {
    pub id: String,
    pub name: Option<String>,
    /// Keyed by provider name: "Tmdb", "Imdb", "Tvdb".
    #[serde(default)]
    pub provider_ids: HashMap<String, String>,
    pub user_data: Option<JellyfinUserData>,
    pub premiere_date: Option<String>,
    pub production_year: Option<i32>,
    pub index_number: Option<i32>,
    /// Season number for episode items.
    pub parent_index_number: Option<i32>,
    /// Owning season's Jellyfin id for episode items.
    pub season_id: Option<String>,
    pub overview: Option<String>,
}

impl JellyfinItem {
    pub fn provider_id(&self, provider: &str) -> Option<String> {
        self.provider_ids
            .get(provider)
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinPage {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Clone)]
pub struct JellyfinClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl JellyfinClient {
    pub fn new(config: &ServiceConfig) -> SyncResult<Self> {
        let (http, base_url) = super::build_client(SERVICE, config)?;
        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
            page_size: config.page_size,
        })
    }

    pub async fn fetch_users(&self) -> SyncResult<Vec<JellyfinUser>> {
        let url = format!("{}/Users", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| SyncError::from_reqwest(SERVICE, e))?;

        let response = super::ensure_success(SERVICE, response).await?;
        response
            .json()
            .await
            .map_err(|e| SyncError::from_reqwest(SERVICE, e))
    }

    /// Movies as one user sees them, with play state attached.
    pub async fn fetch_user_movies(&self, user_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        self.fetch_paged(
            &format!("/Users/{user_id}/Items"),
            &[
                ("IncludeItemTypes", "Movie"),
                ("Recursive", "true"),
                ("Fields", "ProviderIds,PremiereDate"),
            ],
        )
        .await
    }

    pub async fn fetch_movies(&self) -> SyncResult<Vec<JellyfinItem>> {
        self.fetch_paged(
            "/Items",
            &[
                ("IncludeItemTypes", "Movie"),
                ("Recursive", "true"),
                ("Fields", "ProviderIds,PremiereDate"),
            ],
        )
        .await
    }

    pub async fn fetch_series(&self) -> SyncResult<Vec<JellyfinItem>> {
        self.fetch_paged(
            "/Items",
            &[
                ("IncludeItemTypes", "Series"),
                ("Recursive", "true"),
                ("Fields", "ProviderIds,PremiereDate,Overview"),
            ],
        )
        .await
    }

    pub async fn fetch_seasons(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        self.fetch_paged(
            &format!("/Shows/{series_id}/Seasons"),
            &[("Fields", "PremiereDate")],
        )
        .await
    }

    pub async fn fetch_episodes(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        self.fetch_paged(
            &format!("/Shows/{series_id}/Episodes"),
            &[("Fields", "ProviderIds,PremiereDate,Overview")],
        )
        .await
    }

    /// Jellyfin pages every item listing with StartIndex/Limit; walk until a
    /// short page.
    async fn fetch_paged(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> SyncResult<Vec<JellyfinItem>> {
        let url = format!("{}{}", self.base_url, path);
        let mut items = Vec::new();
        let mut start = 0usize;

        loop {
            let response = self
                .http
                .get(&url)
                .header("X-Emby-Token", &self.api_key)
                .query(query)
                .query(&[
                    ("StartIndex", start.to_string()),
                    ("Limit", self.page_size.to_string()),
                ])
                .send()
                .await
                .map_err(|e| SyncError::from_reqwest(SERVICE, e))?;

            let response = super::ensure_success(SERVICE, response).await?;
            let page: JellyfinPage = response
                .json()
                .await
                .map_err(|e| SyncError::from_reqwest(SERVICE, e))?;

            let count = page.items.len();
            items.extend(page.items);

            if count < self.page_size {
                break;
            }
            start += count;
        }

        Ok(items)
    }
}
