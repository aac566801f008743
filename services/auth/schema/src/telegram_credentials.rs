use sea_orm::entity::prelude::*;

/// Telegram binding for a user. One row per user; `chat_id` is unique across
/// all rows when non-null, so a chat can belong to at most one account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "telegram_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    #[sea_orm(unique)]
    pub chat_id: Option<String>,
    pub telegram_username: Option<String>,
    pub is_verified: bool,
    pub linked_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
