use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, TransactionTrait,
};
use tracing::{info, warn};

use crate::clients::radarr::{RadarrClient, RadarrMovie};
use crate::entities::{media, media::MediaKind, movies};
use crate::error::SyncResult;
use crate::sync::merge::FieldMerge;
use crate::sync::resolve::IdCandidates;
use crate::sync::{parse_source_datetime, ImportCounts};

/// Seam for the Radarr catalog fetch so the reconcile path can be exercised
/// without a live server.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch_movies(&self) -> SyncResult<Vec<RadarrMovie>>;
}

#[async_trait]
impl MovieSource for RadarrClient {
    async fn fetch_movies(&self) -> SyncResult<Vec<RadarrMovie>> {
        RadarrClient::fetch_movies(self).await
    }
}

/// One Radarr sync run: fetch everything first, then reconcile inside a
/// single transaction. Any storage error rolls the whole run back.
pub async fn import_movies(
    db: &DatabaseConnection,
    source: &impl MovieSource,
) -> SyncResult<ImportCounts> {
    let records = source.fetch_movies().await?;
    info!("Radarr returned {} movies", records.len());

    let txn = db.begin().await?;
    let counts = apply_movie_records(&txn, &records).await?;
    txn.commit().await?;

    info!(
        imported = counts.imported,
        updated = counts.updated,
        "Radarr movie sync complete"
    );
    Ok(counts)
}

pub async fn apply_movie_records<C: ConnectionTrait>(
    conn: &C,
    records: &[RadarrMovie],
) -> SyncResult<ImportCounts> {
    let mut counts = ImportCounts::default();

    for record in records {
        if record.title.trim().is_empty() {
            warn!(radarr_id = record.id, "skipping movie without a title");
            continue;
        }

        let tmdb = record.tmdb_id_string();
        let imdb = record.imdb_id_string();
        let release_date = record.in_cinemas.as_deref().and_then(parse_source_datetime);

        let existing = IdCandidates::new()
            .then(movies::Column::RadarrId, Some(record.id))
            .any_of([
                tmdb.clone().map(|id| movies::Column::TmdbId.eq(id)),
                imdb.clone().map(|id| movies::Column::ImdbId.eq(id)),
            ])
            .resolve::<movies::Entity, _>(conn)
            .await?;

        match existing {
            Some(movie) => {
                let media_id = movie.id;
                let mut movie_merge = FieldMerge::new();
                let mut movie_am: movies::ActiveModel = movie.into();
                movie_merge.fill_once(&mut movie_am.radarr_id, Some(record.id));
                movie_merge.fill_once(&mut movie_am.tmdb_id, tmdb);
                movie_merge.fill_once(&mut movie_am.imdb_id, imdb);
                movie_merge.overwrite(&mut movie_am.status, record.status.clone());
                if movie_merge.changed() {
                    movie_am.update(conn).await?;
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
                    title: Set(record.title.clone()),
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
                    radarr_id: Set(Some(record.id)),
                    tmdb_id: Set(tmdb),
                    imdb_id: Set(imdb),
                    status: Set(record.status.clone()),
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
