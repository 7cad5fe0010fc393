use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};
use tracing::{info, warn};

use crate::clients::jellyfin::{JellyfinClient, JellyfinItem, JellyfinUser};
use crate::entities::{
    episodes, media, media::MediaKind, movies, seasons, series, users, watch_history,
};
use crate::error::SyncResult;
use crate::sync::merge::FieldMerge;
use crate::sync::resolve::IdCandidates;
use crate::sync::{parse_source_datetime, ImportCounts, SeriesCounts, WatchCounts};

/// Jellyfin item ids are 32-hex GUIDs; anything longer is a malformed
/// payload and gets skipped instead of stored.
const MAX_JELLYFIN_ID_LEN: usize = 64;

/// Seam for the account and play-state endpoints.
#[async_trait]
pub trait PlayStateSource: Send + Sync {
    async fn fetch_users(&self) -> SyncResult<Vec<JellyfinUser>>;
    async fn fetch_user_movies(&self, user_id: &str) -> SyncResult<Vec<JellyfinItem>>;
}

/// Seam for the library listing endpoints.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    async fn fetch_movies(&self) -> SyncResult<Vec<JellyfinItem>>;
    async fn fetch_series(&self) -> SyncResult<Vec<JellyfinItem>>;
    async fn fetch_seasons(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>>;
    async fn fetch_episodes(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>>;
}

#[async_trait]
impl PlayStateSource for JellyfinClient {
    async fn fetch_users(&self) -> SyncResult<Vec<JellyfinUser>> {
        JellyfinClient::fetch_users(self).await
    }

    async fn fetch_user_movies(&self, user_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        JellyfinClient::fetch_user_movies(self, user_id).await
    }
}

#[async_trait]
impl LibrarySource for JellyfinClient {
    async fn fetch_movies(&self) -> SyncResult<Vec<JellyfinItem>> {
        JellyfinClient::fetch_movies(self).await
    }

    async fn fetch_series(&self) -> SyncResult<Vec<JellyfinItem>> {
        JellyfinClient::fetch_series(self).await
    }

    async fn fetch_seasons(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        JellyfinClient::fetch_seasons(self, series_id).await
    }

    async fn fetch_episodes(&self, series_id: &str) -> SyncResult<Vec<JellyfinItem>> {
        JellyfinClient::fetch_episodes(self, series_id).await
    }
}

pub async fn import_users(
    db: &DatabaseConnection,
    source: &impl PlayStateSource,
) -> SyncResult<ImportCounts> {
    let accounts = source.fetch_users().await?;
    info!("Jellyfin returned {} users", accounts.len());

    let txn = db.begin().await?;
    let counts = apply_user_records(&txn, &accounts).await?;
    txn.commit().await?;

    info!(
        imported = counts.imported,
        updated = counts.updated,
        "Jellyfin user import complete"
    );
    Ok(counts)
}

pub async fn apply_user_records<C: ConnectionTrait>(
    conn: &C,
    accounts: &[JellyfinUser],
) -> SyncResult<ImportCounts> {
    let mut counts = ImportCounts::default();

    for account in accounts {
        if account.id.trim().is_empty() || account.name.trim().is_empty() {
            warn!("skipping Jellyfin user with empty id or name");
            continue;
        }

        let existing = users::Entity::find()
            .filter(users::Column::JellyfinUserId.eq(account.id.clone()))
            .one(conn)
            .await?;

        match existing {
            Some(row) => {
                let mut merge = FieldMerge::new();
                let mut am: users::ActiveModel = row.into();
                merge.overwrite_required(&mut am.username, account.name.clone());
                if merge.changed() {
                    am.update(conn).await?;
                    counts.updated += 1;
                }
            }
            None => {
                let am = users::ActiveModel {
                    username: Set(account.name.clone()),
                    jellyfin_user_id: Set(Some(account.id.clone())),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                };
                users::Entity::insert(am).exec(conn).await?;
                counts.imported += 1;
            }
        }
    }

    Ok(counts)
}

/// Pull per-user play state for movies and fold it into the catalog. Every
/// linked local user's full movie view is fetched before the transaction
/// opens.
pub async fn sync_watch_state(
    db: &DatabaseConnection,
    source: &impl PlayStateSource,
) -> SyncResult<WatchCounts> {
    let linked = users::Entity::find()
        .filter(users::Column::JellyfinUserId.is_not_null())
        .all(db)
        .await
        .map_err(crate::error::SyncError::from)?;

    let mut batches = Vec::with_capacity(linked.len());
    for user in linked {
        let Some(jellyfin_user_id) = user.jellyfin_user_id.clone() else {
            continue;
        };
        let items = source.fetch_user_movies(&jellyfin_user_id).await?;
        info!(
            username = %user.username,
            items = items.len(),
            "fetched Jellyfin play state"
        );
        batches.push((user, items));
    }

    let txn = db.begin().await?;
    let counts = apply_watch_records(&txn, &batches).await?;
    txn.commit().await?;

    info!(
        synced = counts.synced,
        updated = counts.updated,
        added = counts.added,
        "Jellyfin watch-state sync complete"
    );
    Ok(counts)
}

pub async fn apply_watch_records<C: ConnectionTrait>(
    conn: &C,
    batches: &[(users::Model, Vec<JellyfinItem>)],
) -> SyncResult<WatchCounts> {
    let mut counts = WatchCounts::default();

    for (user, items) in batches {
        for item in items {
            let tmdb = item.provider_id("Tmdb");
            let imdb = item.provider_id("Imdb");
            let user_data = item.user_data.clone().unwrap_or_default();
            let watched = user_data.played;
            let watched_at = user_data
                .last_played_date
                .as_deref()
                .and_then(parse_source_datetime)
                .filter(|_| watched);

            let existing = IdCandidates::new()
                .then(movies::Column::JellyfinId, Some(item.id.clone()))
                .then(movies::Column::TmdbId, tmdb.clone())
                .then(movies::Column::ImdbId, imdb.clone())
                .resolve::<movies::Entity, _>(conn)
                .await?;

            let (media_id, newly_watched) = match existing {
                Some(row) => {
                    let media_id = row.id;
                    let was_watched = row.watched;

                    let mut merge = FieldMerge::new();
                    let mut am: movies::ActiveModel = row.into();
                    merge.overwrite(&mut am.jellyfin_id, Some(item.id.clone()));
                    merge.fill_once(&mut am.tmdb_id, tmdb);
                    merge.fill_once(&mut am.imdb_id, imdb);
                    merge.overwrite_watched(&mut am.watched, &mut am.watched_at, watched, watched_at);

                    counts.synced += 1;
                    if merge.changed() {
                        am.update(conn).await?;
                        counts.updated += 1;
                    }

                    (media_id, watched && !was_watched)
                }
                None => {
                    let Some(title) = item.name.clone().filter(|t| !t.trim().is_empty()) else {
                        warn!(item_id = %item.id, "skipping unmatched Jellyfin movie without a title");
                        continue;
                    };

                    let media_am = media::ActiveModel {
                        kind: Set(MediaKind::Movie),
                        title: Set(title),
                        release_date: Set(item
                            .premiere_date
                            .as_deref()
                            .and_then(parse_source_datetime)),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    let media_id = media::Entity::insert(media_am)
                        .exec(conn)
                        .await?
                        .last_insert_id;

                    let movie_am = movies::ActiveModel {
                        id: Set(media_id),
                        jellyfin_id: Set(Some(item.id.clone())),
                        tmdb_id: Set(tmdb),
                        imdb_id: Set(imdb),
                        watched: Set(watched),
                        watched_at: Set(watched_at),
                        ..Default::default()
                    };
                    movies::Entity::insert(movie_am).exec(conn).await?;

                    counts.synced += 1;
                    counts.added += 1;
                    (media_id, watched)
                }
            };

            if newly_watched {
                let entry = watch_history::ActiveModel {
                    user_id: Set(user.id),
                    media_id: Set(media_id),
                    episode_id: Set(None),
                    watched_at: Set(watched_at.unwrap_or_else(Utc::now)),
                    ..Default::default()
                };
                watch_history::Entity::insert(entry).exec(conn).await?;
            }
        }
    }

    Ok(counts)
}

pub async fn import_movies(
    db: &DatabaseConnection,
    source: &impl LibrarySource,
) -> SyncResult<ImportCounts> {
    let items = source.fetch_movies().await?;
    info!("Jellyfin returned {} library movies", items.len());

    let txn = db.begin().await?;
    let counts = apply_library_movie_records(&txn, &items).await?;
    txn.commit().await?;

    info!(
        imported = counts.imported,
        updated = counts.updated,
        "Jellyfin movie import complete"
    );
    Ok(counts)
}

pub async fn apply_library_movie_records<C: ConnectionTrait>(
    conn: &C,
    items: &[JellyfinItem],
) -> SyncResult<ImportCounts> {
    let mut counts = ImportCounts::default();

    for item in items {
        if item.id.len() > MAX_JELLYFIN_ID_LEN {
            warn!("skipping Jellyfin movie with oversized item id");
            continue;
        }
        let Some(title) = item.name.clone().filter(|t| !t.trim().is_empty()) else {
            warn!(item_id = %item.id, "skipping Jellyfin movie without a title");
            continue;
        };

        let tmdb = item.provider_id("Tmdb");
        let imdb = item.provider_id("Imdb");
        let release_date = item.premiere_date.as_deref().and_then(parse_source_datetime);

        let existing = IdCandidates::new()
            .then(movies::Column::JellyfinId, Some(item.id.clone()))
            .any_of([
                tmdb.clone().map(|id| movies::Column::TmdbId.eq(id)),
                imdb.clone().map(|id| movies::Column::ImdbId.eq(id)),
            ])
            .resolve::<movies::Entity, _>(conn)
            .await?;

        match existing {
            Some(row) => {
                let media_id = row.id;
                let mut movie_merge = FieldMerge::new();
                let mut am: movies::ActiveModel = row.into();
                movie_merge.fill_once(&mut am.jellyfin_id, Some(item.id.clone()));
                movie_merge.fill_once(&mut am.tmdb_id, tmdb);
                movie_merge.fill_once(&mut am.imdb_id, imdb);
                if movie_merge.changed() {
                    am.update(conn).await?;
                }

                let mut media_changed = false;
                if let Some(media_row) = media::Entity::find_by_id(media_id).one(conn).await? {
                    let mut media_merge = FieldMerge::new();
                    let mut media_am: media::ActiveModel = media_row.into();
                    media_merge.fill_once(&mut media_am.release_date, release_date);
                    if media_merge.changed() {
                        media_am.update(conn).await?;
                        media_changed = true;
                    }
                }

                if movie_merge.changed() || media_changed {
                    counts.updated += 1;
                }
            }
            None => {
                let media_am = media::ActiveModel {
                    kind: Set(MediaKind::Movie),
                    title: Set(title),
                    release_date: Set(release_date),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                };
                let media_id = media::Entity::insert(media_am)
                    .exec(conn)
                    .await?
                    .last_insert_id;

                let movie_am = movies::ActiveModel {
                    id: Set(media_id),
                    jellyfin_id: Set(Some(item.id.clone())),
                    tmdb_id: Set(tmdb),
                    imdb_id: Set(imdb),
                    watched: Set(false),
                    ..Default::default()
                };
                movies::Entity::insert(movie_am).exec(conn).await?;
                counts.imported += 1;
            }
        }
    }

    Ok(counts)
}

pub async fn import_series(
    db: &DatabaseConnection,
    source: &impl LibrarySource,
) -> SyncResult<SeriesCounts> {
    let series_items = source.fetch_series().await?;
    info!("Jellyfin returned {} library series", series_items.len());

    let mut records = Vec::with_capacity(series_items.len());
    for item in series_items {
        if item.id.len() > MAX_JELLYFIN_ID_LEN {
            warn!("skipping Jellyfin series with oversized item id");
            continue;
        }
        let season_items = source.fetch_seasons(&item.id).await?;
        let episode_items = source.fetch_episodes(&item.id).await?;
        records.push((item, season_items, episode_items));
    }

    let txn = db.begin().await?;
    let counts = apply_library_series_records(&txn, &records).await?;
    txn.commit().await?;

    info!(
        new_series = counts.new_series,
        updated_series = counts.updated_series,
        new_episodes = counts.new_episodes,
        updated_episodes = counts.updated_episodes,
        "Jellyfin series import complete"
    );
    Ok(counts)
}

pub async fn apply_library_series_records<C: ConnectionTrait>(
    conn: &C,
    records: &[(JellyfinItem, Vec<JellyfinItem>, Vec<JellyfinItem>)],
) -> SyncResult<SeriesCounts> {
    let mut counts = SeriesCounts::default();

    for (item, season_items, episode_items) in records {
        if item.id.len() > MAX_JELLYFIN_ID_LEN {
            warn!("skipping Jellyfin series with oversized item id");
            continue;
        }
        let Some(title) = item.name.clone().filter(|t| !t.trim().is_empty()) else {
            warn!(item_id = %item.id, "skipping Jellyfin series without a title");
            continue;
        };

        let tvdb = item.provider_id("Tvdb");
        let tmdb = item.provider_id("Tmdb");
        let imdb = item.provider_id("Imdb");
        let first_aired = item.premiere_date.as_deref().and_then(parse_source_datetime);

        let existing = IdCandidates::new()
            .then(series::Column::JellyfinId, Some(item.id.clone()))
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
                let mut am: series::ActiveModel = row.into();
                series_merge.fill_once(&mut am.jellyfin_id, Some(item.id.clone()));
                series_merge.fill_once(&mut am.tvdb_id, tvdb);
                series_merge.fill_once(&mut am.tmdb_id, tmdb);
                series_merge.fill_once(&mut am.imdb_id, imdb);
                series_merge.fill_once(&mut am.year, item.production_year);
                if series_merge.changed() {
                    am.update(conn).await?;
                }

                let mut media_changed = false;
                if let Some(media_row) = media::Entity::find_by_id(series_id).one(conn).await? {
                    let mut media_merge = FieldMerge::new();
                    let mut media_am: media::ActiveModel = media_row.into();
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
                    title: Set(title),
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
                    jellyfin_id: Set(Some(item.id.clone())),
                    tvdb_id: Set(tvdb),
                    tmdb_id: Set(tmdb),
                    imdb_id: Set(imdb),
                    year: Set(item.production_year),
                    ..Default::default()
                };
                series::Entity::insert(series_am).exec(conn).await?;
                counts.new_series += 1;
                media_id
            }
        };

        // Local season id keyed by the season's Jellyfin id, for episode
        // placement below.
        let mut season_ids: HashMap<String, i32> = HashMap::new();
        let mut seasons_by_number: HashMap<i32, i32> = HashMap::new();

        for season_item in season_items {
            if season_item.id.len() > MAX_JELLYFIN_ID_LEN {
                warn!("skipping Jellyfin season with oversized item id");
                continue;
            }
            let Some(number) = season_item.index_number else {
                warn!(item_id = %season_item.id, "skipping Jellyfin season without a number");
                continue;
            };
            let release_date = season_item
                .premiere_date
                .as_deref()
                .and_then(parse_source_datetime);

            // Prefer the season's own Jellyfin id; fall back to the number
            // slot a Sonarr run may already have created.
            let existing = match seasons::Entity::find()
                .filter(seasons::Column::SeriesId.eq(series_id))
                .filter(seasons::Column::JellyfinId.eq(season_item.id.clone()))
                .one(conn)
                .await?
            {
                Some(found) => Some(found),
                None => {
                    seasons::Entity::find()
                        .filter(seasons::Column::SeriesId.eq(series_id))
                        .filter(seasons::Column::Number.eq(number))
                        .one(conn)
                        .await?
                }
            };

            let season_id = match existing {
                Some(row) => {
                    let season_id = row.id;
                    let mut merge = FieldMerge::new();
                    let mut am: seasons::ActiveModel = row.into();
                    merge.fill_once(&mut am.jellyfin_id, Some(season_item.id.clone()));
                    merge.fill_once(&mut am.release_date, release_date);
                    if merge.changed() {
                        am.update(conn).await?;
                    }
                    season_id
                }
                None => {
                    let am = seasons::ActiveModel {
                        series_id: Set(series_id),
                        number: Set(number),
                        jellyfin_id: Set(Some(season_item.id.clone())),
                        release_date: Set(release_date),
                        ..Default::default()
                    };
                    seasons::Entity::insert(am).exec(conn).await?.last_insert_id
                }
            };

            season_ids.insert(season_item.id.clone(), season_id);
            seasons_by_number.insert(number, season_id);
        }

        for episode_item in episode_items {
            if episode_item.id.len() > MAX_JELLYFIN_ID_LEN {
                warn!("skipping Jellyfin episode with oversized item id");
                continue;
            }
            let Some(number) = episode_item.index_number else {
                warn!(item_id = %episode_item.id, "skipping Jellyfin episode without a number");
                continue;
            };
            let season_id = episode_item
                .season_id
                .as_ref()
                .and_then(|id| season_ids.get(id))
                .or_else(|| {
                    episode_item
                        .parent_index_number
                        .and_then(|n| seasons_by_number.get(&n))
                });
            let Some(season_id) = season_id.copied() else {
                warn!(item_id = %episode_item.id, "skipping Jellyfin episode without a known season");
                continue;
            };

            let title = episode_item
                .name
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("Episode {number}"));
            let air_date = episode_item
                .premiere_date
                .as_deref()
                .and_then(parse_source_datetime);

            let existing = IdCandidates::new()
                .then(episodes::Column::JellyfinId, Some(episode_item.id.clone()))
                .resolve::<episodes::Entity, _>(conn)
                .await?;

            match existing {
                Some(row) => {
                    let mut merge = FieldMerge::new();
                    let mut am: episodes::ActiveModel = row.into();
                    merge.overwrite_required(&mut am.season_id, season_id);
                    merge.overwrite_required(&mut am.number, number);
                    merge.overwrite_required(&mut am.title, title);
                    merge.overwrite(&mut am.air_date, air_date);
                    merge.overwrite(&mut am.overview, episode_item.overview.clone());
                    if merge.changed() {
                        am.update(conn).await?;
                        counts.updated_episodes += 1;
                    }
                }
                None => {
                    let am = episodes::ActiveModel {
                        season_id: Set(season_id),
                        jellyfin_id: Set(Some(episode_item.id.clone())),
                        number: Set(number),
                        title: Set(title),
                        air_date: Set(air_date),
                        overview: Set(episode_item.overview.clone()),
                        ..Default::default()
                    };
                    episodes::Entity::insert(am).exec(conn).await?;
                    counts.new_episodes += 1;
                }
            }
        }
    }

    Ok(counts)
}
