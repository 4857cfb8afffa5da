use sea_orm::entity::prelude::*;

/// Per-board display settings. Exactly one row per board, created lazily on
/// first settings access.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "board_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub board_id: i32,

    /// youtube, google_photos, dropbox, url, none, preset
    pub background_type: Option<String>,

    pub background_source: Option<String>,

    pub background_config: Option<Json>,

    pub background_preset: Option<String>,

    pub resolution_width: Option<i32>,

    pub resolution_height: Option<i32>,

    pub aspect_ratio: Option<String>,

    pub orientation: Option<String>,

    pub auto_rotate_pages: bool,

    pub lockout_mode: bool,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::boards::Entity",
        from = "Column::BoardId",
        to = "super::boards::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Boards,
}

impl Related<super::boards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boards.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
