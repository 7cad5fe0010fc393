use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{info, warn};

use crate::clients::sonarr::{SonarrClient, SonarrEpisode, SonarrSeries};
use crate::entities::{episodes, media, media::MediaKind, seasons, series};
use crate::error::SyncResult;
use crate::sync::merge::FieldMerge;
use crate::sync::resolve::IdCandidates;
use crate::sync::{parse_source_datetime, SeriesCounts};

/// Seam for the Sonarr catalog fetch. Episodes come per series so the full
/// payload is assembled before any transaction opens.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch_series(&self) -> SyncResult<Vec<SonarrSeries>>;
    async fn fetch_episodes(&self, series_id: i32) -> SyncResult<Vec<SonarrEpisode>>;
}

#[async_trait]
impl SeriesSource for SonarrClient {
    async fn fetch_series(&self) -> SyncResult<Vec<SonarrSeries>> {
        SonarrClient::fetch_series(self).await
    }

    async fn fetch_episodes(&self, series_id: i32) -> SyncResult<Vec<SonarrEpisode>> {
        SonarrClient::fetch_episodes(self, series_id).await
    }
}

pub async fn import_series(
    db: &DatabaseConnection,
    source: &impl SeriesSource,
) -> SyncResult<SeriesCounts> {
    let series_list = source.fetch_series().await?;
    info!("Sonarr returned {} series", series_list.len());

    let mut records = Vec::with_capacity(series_list.len());
    for record in series_list {
        if record.title.trim().is_empty() {
            warn!(sonarr_id = record.id, "skipping series without a title");
            continue;
        }
        let episode_list = source.fetch_episodes(record.id).await?;
        records.push((record, episode_list));
    }

    let txn = db.begin().await?;
    let counts = apply_series_records(&txn, &records).await?;
    txn.commit().await?;

    info!(
        new_series = counts.new_series,
        updated_series = counts.updated_series,
        new_episodes = counts.new_episodes,
        updated_episodes = counts.updated_episodes,
        "Sonarr series sync complete"
    );
    Ok(counts)
}

pub async fn apply_series_records<C: ConnectionTrait>(
    conn: &C,
    records: &[(SonarrSeries, Vec<SonarrEpisode>)],
) -> SyncResult<SeriesCounts> {
    let mut counts = SeriesCounts::default();

    for (record, episode_list) in records {
        if record.title.trim().is_empty() {
            warn!(sonarr_id = record.id, "skipping series without a title");
            continue;
        }

        let tvdb = record.tvdb_id_string();
        let tmdb = record.tmdb_id_string();
        let imdb = record.imdb_id_string();
        let first_aired = record
            .first_aired
            .as_deref()
            .and_then(parse_source_datetime);
        let genres_json = if record.genres.is_empty() {
            None
        } else {
            serde_json::to_string(&record.genres).ok()
        };
        let (rating_value, rating_votes) = record
            .ratings
            .as_ref()
            .map_or((None, None), |r| (r.value, r.votes));

        let existing = IdCandidates::new()
            .then(series::Column::SonarrId, Some(record.id))
            .any_of([
                tvdb.clone().map(|id| series::Column::TvdbId.eq(id)),
                tmdb.clone().map(|id| series::Column::TmdbId.eq(id)),
                imdb.clone().map(|id| series::Column::ImdbId.eq(id)),
            ])
            .resolve::<series::Entity, _>(conn)
            .await?;

        let series_id = match existing {
            Some(row) => {
                let series_id = row.id;
                let mut series_merge = FieldMerge::new();
                let mut series_am: series::ActiveModel = row.into();
                series_merge.fill_once(&mut series_am.sonarr_id, Some(record.id));
                series_merge.fill_once(&mut series_am.tvdb_id, tvdb);
                series_merge.fill_once(&mut series_am.tmdb_id, tmdb);
                series_merge.fill_once(&mut series_am.imdb_id, imdb);
                series_merge.fill_once(&mut series_am.year, record.year);
                series_merge.fill_once(&mut series_am.genres, genres_json);
                series_merge.fill_once(&mut series_am.poster_url, record.poster_url());
                series_merge.overwrite(&mut series_am.status, record.status.clone());
                series_merge.overwrite(&mut series_am.rating_value, rating_value);
                series_merge.overwrite(&mut series_am.rating_votes, rating_votes);
                if series_merge.changed() {
                    series_am.update(conn).await?;
                }

                let mut media_changed = false;
                if let Some(media_row) = media::Entity::find_by_id(series_id).one(conn).await? {
                    let mut media_merge = FieldMerge::new();
                    let mut media_am: media::ActiveModel = media_row.into();
                    media_merge.overwrite_required(&mut media_am.title, record.title.clone());
                    media_merge.fill_once(&mut media_am.release_date, first_aired);
                    if media_merge.changed() {
                        media_am.update(conn).await?;
                        media_changed = true;
                    }
                }

                if series_merge.changed() || media_changed {
                    counts.updated_series += 1;
                }
                series_id
            }
            None => {
                let media_am = media::ActiveModel {
                    kind: Set(MediaKind::Series),
                    title: Set(record.title.clone()),
                    release_date: Set(first_aired),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                };
                let media_id = media::Entity::insert(media_am)
                    .exec(conn)
                    .await?
                    .last_insert_id;

                let series_am = series::ActiveModel {
                    id: Set(media_id),
                    sonarr_id: Set(Some(record.id)),
                    tvdb_id: Set(tvdb),
                    tmdb_id: Set(tmdb),
                    imdb_id: Set(imdb),
                    status: Set(record.status.clone()),
                    poster_url: Set(record.poster_url()),
                    year: Set(record.year),
                    genres: Set(genres_json),
                    rating_value: Set(rating_value),
                    rating_votes: Set(rating_votes),
                    ..Default::default()
                };
                series::Entity::insert(series_am).exec(conn).await?;

                counts.new_series += 1;
                media_id
            }
        };

        let mut season_ids: HashMap<i32, i32> = HashMap::new();
        for season in &record.seasons {
            let id = ensure_season(conn, series_id, season.season_number).await?;
            season_ids.insert(season.season_number, id);
        }

        // Earliest air date seen per season, used to backfill still-null
        // season release dates afterwards.
        let mut earliest: HashMap<i32, chrono::DateTime<Utc>> = HashMap::new();

        for episode in episode_list {
            let season_id = match season_ids.get(&episode.season_number) {
                Some(id) => *id,
                None => {
                    let id = ensure_season(conn, series_id, episode.season_number).await?;
                    season_ids.insert(episode.season_number, id);
                    id
                }
            };

            let title = episode
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("Episode {}", episode.episode_number));
            let air_date = episode
                .air_date_utc
                .as_deref()
                .and_then(parse_source_datetime);
            if let Some(at) = air_date {
                earliest
                    .entry(episode.season_number)
                    .and_modify(|current| {
                        if at < *current {
                            *current = at;
                        }
                    })
                    .or_insert(at);
            }

            let existing = IdCandidates::new()
                .then(episodes::Column::SonarrId, Some(episode.id))
                .resolve::<episodes::Entity, _>(conn)
                .await?;

            match existing {
                Some(row) => {
                    let mut merge = FieldMerge::new();
                    let mut am: episodes::ActiveModel = row.into();
                    merge.overwrite_required(&mut am.season_id, season_id);
                    merge.overwrite_required(&mut am.number, episode.episode_number);
                    merge.overwrite_required(&mut am.title, title);
                    merge.overwrite(&mut am.air_date, air_date);
                    merge.overwrite(&mut am.overview, episode.overview.clone());
                    if merge.changed() {
                        am.update(conn).await?;
                        counts.updated_episodes += 1;
                    }
                }
                None => {
                    let am = episodes::ActiveModel {
                        season_id: Set(season_id),
                        sonarr_id: Set(Some(episode.id)),
                        number: Set(episode.episode_number),
                        title: Set(title),
                        air_date: Set(air_date),
                        overview: Set(episode.overview.clone()),
                        ..Default::default()
                    };
                    episodes::Entity::insert(am).exec(conn).await?;
                    counts.new_episodes += 1;
                }
            }
        }

        for (number, at) in earliest {
            let Some(season_id) = season_ids.get(&number) else {
                continue;
            };
            if let Some(season) = seasons::Entity::find_by_id(*season_id).one(conn).await? {
                if season.release_date.is_none() {
                    let mut am: seasons::ActiveModel = season.into();
                    am.release_date = Set(Some(at));
                    am.update(conn).await?;
                }
            }
        }
    }

    Ok(counts)
}

async fn ensure_season<C: ConnectionTrait>(
    conn: &C,
    series_id: i32,
    number: i32,
) -> Result<i32, sea_orm::DbErr> {
    if let Some(season) = seasons::Entity::find()
        .filter(seasons::Column::SeriesId.eq(series_id))
        .filter(seasons::Column::Number.eq(number))
        .one(conn)
        .await?
    {
        return Ok(season.id);
    }

    let am = seasons::ActiveModel {
        series_id: Set(series_id),
        number: Set(number),
        ..Default::default()
    };
    Ok(seasons::Entity::insert(am).exec(conn).await?.last_insert_id)
}
