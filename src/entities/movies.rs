use sea_orm::entity::prelude::*;

/// Movie-specific columns; the row id is the owning `media` id.
///
/// External identifiers are nullable but unique: a movie may arrive from any
/// source first, and later sources fill the ids they know about.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(unique)]
    pub radarr_id: Option<i32>,
    #[sea_orm(unique)]
    pub tmdb_id: Option<String>,
    #[sea_orm(unique)]
    pub imdb_id: Option<String>,
    #[sea_orm(unique)]
    pub jellyfin_id: Option<String>,
    pub status: Option<String>,
    pub watched: bool,
    pub watched_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::media::Entity",
        from = "Column::Id",
        to = "super::media::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Media,
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
