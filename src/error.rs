use thiserror::Error;

/// Failure taxonomy for a sync run. A run either completes with a summary or
/// fails with exactly one of these; per-record validation problems are logged
/// and skipped, never surfaced here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or unusable local configuration. Fatal for the run and fixable
    /// by the caller, not by retrying.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream service could not be reached at all.
    #[error("{service} unreachable: {message}")]
    Network {
        service: String,
        message: String,
        timeout: bool,
    },

    /// The upstream service answered with a non-success status.
    #[error("{service} returned status {status}")]
    Protocol {
        service: String,
        status: u16,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

impl SyncError {
    pub fn from_reqwest(service: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Protocol {
                service: service.to_string(),
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network {
                service: service.to_string(),
                message: err.to_string(),
                timeout: err.is_timeout(),
            }
        }
    }

    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Protocol { status: 429, .. })
    }

    /// Unique-constraint violations get their own HTTP mapping, so pick them
    /// out of the storage bucket. SQLite reports them in the message text.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Storage(err) => {
                let text = err.to_string();
                text.contains("UNIQUE constraint") || text.to_lowercase().contains("unique")
            }
            _ => false,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_a_protocol_subtype() {
        let err = SyncError::Protocol {
            service: "Radarr".to_string(),
            status: 429,
            message: "slow down".to_string(),
        };
        assert!(err.is_rate_limited());

        let err = SyncError::Protocol {
            service: "Radarr".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn conflict_detected_from_unique_violation_text() {
        let err = SyncError::Storage(sea_orm::DbErr::Custom(
            "UNIQUE constraint failed: movies.tmdb_id".to_string(),
        ));
        assert!(err.is_conflict());

        let err = SyncError::Storage(sea_orm::DbErr::Custom("database is locked".to_string()));
        assert!(!err.is_conflict());
    }
}
