use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sea_orm::entity::prelude::DateTimeUtc;
use tracing::warn;

pub mod jellyfin;
pub mod merge;
pub mod radarr;
pub mod resolve;
pub mod sonarr;

/// Counters for the flat import runs (movies, users). A run returns exactly
/// one of these; partial counts never escape a failed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportCounts {
    pub imported: u32,
    pub updated: u32,
}

/// Counters for the series graph runs (Sonarr, Jellyfin library series).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeriesCounts {
    pub new_series: u32,
    pub updated_series: u32,
    pub new_episodes: u32,
    pub updated_episodes: u32,
}

/// Counters for the watch-state run: `synced` counts every item folded into
/// the catalog (matched or newly created), `updated` actually changed an
/// existing movie, `added` created a new one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchCounts {
    pub synced: u32,
    pub updated: u32,
    pub added: u32,
}

/// Normalize a source timestamp to UTC. Offset-qualified input is converted;
/// naive input is assumed to already be UTC; garbage is dropped with a
/// warning rather than failing the run.
pub fn parse_source_datetime(raw: &str) -> Option<DateTimeUtc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    warn!("unparseable source timestamp: {raw}");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_with_offset_converts_to_utc() {
        let parsed = parse_source_datetime("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T08:30:00+00:00");
    }

    #[test]
    fn naive_datetime_assumed_utc() {
        let parsed = parse_source_datetime("2024-03-01T10:30:00.1234567").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 10:30");
    }

    #[test]
    fn bare_date_becomes_midnight_utc() {
        let parsed = parse_source_datetime("2024-03-01").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn garbage_and_empty_yield_none() {
        assert!(parse_source_datetime("not a date").is_none());
        assert!(parse_source_datetime("   ").is_none());
    }
}
