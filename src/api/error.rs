use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::error;

use crate::api::types::ErrorBody;
use crate::error::SyncError;

/// Single mapping point from the sync taxonomy to HTTP. Responses carry a
/// stable code and a sanitized message; the full error goes to the log only.
pub struct ApiError(SyncError);

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("sync request failed: {}", self.0);

        let (status, code, message) = match &self.0 {
            SyncError::Configuration(message) => (
                StatusCode::BAD_REQUEST,
                "configuration_error",
                message.clone(),
            ),
            SyncError::Network {
                service,
                timeout: true,
                ..
            } => (
                StatusCode::GATEWAY_TIMEOUT,
                "upstream_timeout",
                format!("{service} did not answer in time"),
            ),
            SyncError::Network { service, .. } => (
                StatusCode::BAD_GATEWAY,
                "upstream_unreachable",
                format!("{service} could not be reached"),
            ),
            SyncError::Protocol {
                service, status, ..
            } => {
                if self.0.is_rate_limited() {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        "upstream_rate_limited",
                        format!("{service} is rate limiting requests"),
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        "upstream_error",
                        format!("{service} returned status {status}"),
                    )
                }
            }
            SyncError::Storage(_) => {
                if self.0.is_conflict() {
                    (
                        StatusCode::CONFLICT,
                        "storage_conflict",
                        "conflicting identifiers in stored catalog".to_string(),
                    )
                } else {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "storage_error",
                        "storage failure during sync".to_string(),
                    )
                }
            }
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: SyncError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            status_of(SyncError::Configuration("no url".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SyncError::Network {
                service: "Radarr".to_string(),
                message: "refused".to_string(),
                timeout: false,
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SyncError::Network {
                service: "Radarr".to_string(),
                message: "timed out".to_string(),
                timeout: true,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(SyncError::Protocol {
                service: "Sonarr".to_string(),
                status: 429,
                message: String::new(),
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(SyncError::Protocol {
                service: "Sonarr".to_string(),
                status: 500,
                message: String::new(),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SyncError::Storage(sea_orm::DbErr::Custom(
                "UNIQUE constraint failed: movies.tmdb_id".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(SyncError::Storage(sea_orm::DbErr::Custom(
                "disk I/O error".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
