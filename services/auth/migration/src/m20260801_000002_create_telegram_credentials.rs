use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TelegramCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TelegramCredentials::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TelegramCredentials::ChatId).string())
                    .col(ColumnDef::new(TelegramCredentials::TelegramUsername).string())
                    .col(
                        ColumnDef::new(TelegramCredentials::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TelegramCredentials::LinkedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(TelegramCredentials::Table, TelegramCredentials::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Enforces the one-owner-per-chat invariant; Postgres unique indexes
        // admit any number of NULLs, so unlinked rows do not collide.
        manager
            .create_index(
                Index::create()
                    .table(TelegramCredentials::Table)
                    .col(TelegramCredentials::ChatId)
                    .name("idx_telegram_credentials_chat_id")
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TelegramCredentials::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TelegramCredentials {
    Table,
    UserId,
    ChatId,
    TelegramUsername,
    IsVerified,
    LinkedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
