use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LinkTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LinkTokens::UserId).big_integer().not_null())
                    .col(ColumnDef::new(LinkTokens::TokenDigest).text().not_null())
                    .col(ColumnDef::new(LinkTokens::TokenIndex).string().not_null())
                    .col(
                        ColumnDef::new(LinkTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LinkTokens::UsedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LinkTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LinkTokens::Table, LinkTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookup index, deliberately non-unique: the HMAC narrows candidates,
        // the argon2 digest decides.
        manager
            .create_index(
                Index::create()
                    .table(LinkTokens::Table)
                    .col(LinkTokens::TokenIndex)
                    .name("idx_link_tokens_token_index")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LinkTokens {
    Table,
    Id,
    UserId,
    TokenDigest,
    TokenIndex,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
