use sea_orm::entity::prelude::*;

/// Account record. The password digest is an argon2 PHC string and is only
/// ever compared through the hasher, never read back as plaintext.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(column_type = "Text")]
    pub password_digest: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::otp_challenges::Entity")]
    OtpChallenges,
    #[sea_orm(has_many = "super::link_tokens::Entity")]
    LinkTokens,
    #[sea_orm(has_many = "super::recovery_codes::Entity")]
    RecoveryCodes,
}

impl Related<super::otp_challenges::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OtpChallenges.def()
    }
}

impl Related<super::link_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkTokens.def()
    }
}

impl Related<super::recovery_codes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecoveryCodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
