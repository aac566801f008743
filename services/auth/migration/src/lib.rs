use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_telegram_credentials;
mod m20260801_000003_create_otp_challenges;
mod m20260801_000004_create_link_tokens;
mod m20260801_000005_create_recovery_codes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_users::Migration),
            Box::new(m20260801_000002_create_telegram_credentials::Migration),
            Box::new(m20260801_000003_create_otp_challenges::Migration),
            Box::new(m20260801_000004_create_link_tokens::Migration),
            Box::new(m20260801_000005_create_recovery_codes::Migration),
        ]
    }
}
