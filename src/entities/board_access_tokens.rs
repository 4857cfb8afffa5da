use sea_orm::entity::prelude::*;

/// Long-lived, board-scoped API credential. Only the SHA-256 digest of the
/// secret is stored; the plaintext is handed out once at creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "board_access_tokens")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub board_id: i32,

    #[sea_orm(unique)]
    pub token_hash: String,

    pub name: Option<String>,

    pub created_at: DateTimeUtc,

    /// None means the token never expires.
    pub expires_at: Option<DateTimeUtc>,

    pub last_used_at: Option<DateTimeUtc>,

    /// Revocation flag, independent of deletion.
    pub is_active: bool,
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

impl Model {
    /// A token is usable iff it is active and not past its expiry.
    #[must_use]
    pub fn is_usable(&self, now: DateTimeUtc) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

impl ActiveModelBehavior for ActiveModel {}
