use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record. `password_digest` is an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_digest: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Telegram binding for a user. At most one user may hold a given chat id
/// at any time; an unlinked user keeps a cleared placeholder row.
#[derive(Debug, Clone)]
pub struct TelegramBinding {
    pub user_id: i64,
    pub chat_id: Option<String>,
    pub telegram_username: Option<String>,
    pub is_verified: bool,
    pub linked_at: Option<DateTime<Utc>>,
}

impl TelegramBinding {
    /// Placeholder row created at registration.
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            chat_id: None,
            telegram_username: None,
            is_verified: false,
            linked_at: None,
        }
    }

}

/// What a one-time code authorizes once verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpContext {
    Login,
    Sensitive,
    TelegramChange,
}

impl OtpContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Sensitive => "sensitive",
            Self::TelegramChange => "telegram_change",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "login" => Some(Self::Login),
            "sensitive" => Some(Self::Sensitive),
            "telegram_change" => Some(Self::TelegramChange),
            _ => None,
        }
    }
}

/// One-time code challenge. Looked up by its opaque id, which the caller
/// receives at issuance.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    pub id: Uuid,
    pub user_id: i64,
    pub code_digest: String,
    pub context: OtpContext,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Telegram account-linking token. Looked up globally by deterministic index.
#[derive(Debug, Clone)]
pub struct LinkToken {
    pub id: Uuid,
    pub user_id: i64,
    pub token_digest: String,
    pub token_index: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Single-use recovery code. Looked up per subject by deterministic index.
/// No expiry: a code is live until spent.
#[derive(Debug, Clone)]
pub struct RecoveryCode {
    pub id: Uuid,
    pub user_id: i64,
    pub code_digest: String,
    pub code_index: String,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One-time code length in decimal digits.
pub const OTP_LEN: usize = 6;

/// One-time code time-to-live in seconds.
pub const OTP_TTL_SECS: i64 = 120;

/// Link token entropy in bytes (hex-encoded on the wire).
pub const LINK_TOKEN_BYTES: usize = 24;

/// Link token time-to-live in seconds.
pub const LINK_TOKEN_TTL_SECS: i64 = 600;

/// Recovery codes issued per batch on first Telegram bind.
pub const RECOVERY_BATCH_SIZE: usize = 8;
