use sea_orm::entity::prelude::*;

/// Series-specific columns; the row id is the owning `media` id.
/// `genres` holds a JSON array string, matching how the sources ship them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "series")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sonarr_id: Option<i32>,
    #[sea_orm(unique)]
    pub tvdb_id: Option<String>,
    #[sea_orm(unique)]
    pub tmdb_id: Option<String>,
    #[sea_orm(unique)]
    pub imdb_id: Option<String>,
    #[sea_orm(unique)]
    pub jellyfin_id: Option<String>,
    pub status: Option<String>,
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub genres: Option<String>,
    pub rating_value: Option<f64>,
    pub rating_votes: Option<i32>,
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
    #[sea_orm(has_many = "super::seasons::Entity")]
    Seasons,
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl Related<super::seasons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seasons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
