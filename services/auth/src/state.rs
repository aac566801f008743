use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use crate::crypto::{DeterministicIndexer, SecretHasher};
use crate::infra::db::{
    DbBindingRepository, DbLinkTokenRepository, DbOtpChallengeRepository, DbRecoveryCodeRepository,
    DbUserRepository,
};
use crate::infra::telegram::TelegramMessenger;

/// Shared application state passed to every handler via axum `State`.
/// The hasher and indexer carry the process-wide keying secrets, read-only
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub hasher: SecretHasher,
    pub indexer: DeterministicIndexer,
    pub messenger: TelegramMessenger,
    pub jwt_secret: String,
    pub debug_otp: bool,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn binding_repo(&self) -> DbBindingRepository {
        DbBindingRepository {
            db: self.db.clone(),
        }
    }

    pub fn otp_repo(&self) -> DbOtpChallengeRepository {
        DbOtpChallengeRepository {
            db: self.db.clone(),
        }
    }

    pub fn link_token_repo(&self) -> DbLinkTokenRepository {
        DbLinkTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn recovery_code_repo(&self) -> DbRecoveryCodeRepository {
        DbRecoveryCodeRepository {
            db: self.db.clone(),
        }
    }
}

// Lets the shared readiness handler extract the connection directly.
impl FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
