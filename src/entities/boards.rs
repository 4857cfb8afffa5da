use sea_orm::entity::prelude::*;

/// A dashboard board. Titles are unique per owner (composite index created
/// in the initial migration), not globally.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "boards")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub owner_id: i32,

    pub title: String,

    pub description: Option<String>,

    /// Opaque layout document; consumers validate only what they read.
    pub layout_config: Option<Json>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,

    #[sea_orm(has_many = "super::widgets::Entity")]
    Widgets,

    #[sea_orm(has_one = "super::board_settings::Entity")]
    BoardSettings,

    #[sea_orm(has_many = "super::board_access_tokens::Entity")]
    BoardAccessTokens,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::widgets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Widgets.def()
    }
}

impl Related<super::board_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoardSettings.def()
    }
}

impl Related<super::board_access_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoardAccessTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
