use reqwest::Client;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{SyncError, SyncResult};

pub mod jellyfin;
pub mod radarr;
pub mod sonarr;

pub use jellyfin::JellyfinClient;
pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;

pub(crate) fn build_client(service: &str, config: &ServiceConfig) -> SyncResult<(Client, String)> {
    if config.url.trim().is_empty() {
        return Err(SyncError::Configuration(format!(
            "{service} url is not configured"
        )));
    }
    if config.api_key.trim().is_empty() {
        return Err(SyncError::Configuration(format!(
            "{service} api key is not configured"
        )));
    }

    let http = Client::builder()
        .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
        .build()
        .map_err(|e| SyncError::Configuration(format!("failed to build http client: {e}")))?;

    Ok((http, config.url.trim_end_matches('/').to_string()))
}

/// Turn a non-success response into a Protocol error, keeping the upstream
/// body for logs only.
pub(crate) async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Protocol {
        service: service.to_string(),
        status: status.as_u16(),
        message,
    })
}
