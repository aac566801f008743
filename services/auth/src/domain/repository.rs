#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{LinkToken, OtpChallenge, RecoveryCode, TelegramBinding, User};
use crate::error::AuthServiceError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate email or username maps to
    /// `AuthServiceError::UserExists`.
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_digest: &str,
    ) -> Result<User, AuthServiceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthServiceError>;

    /// Find by email or username, whichever matches.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthServiceError>;
}

/// Outcome of a single transactional clear-then-assign bind attempt.
#[derive(Debug)]
pub enum AssignChatError {
    /// The chat-id unique constraint fired anyway — a concurrent bind
    /// interleaved between the clear and the assign.
    UniqueViolation,
    Store(AuthServiceError),
}

/// Repository for Telegram bindings. All mutation goes through the binding
/// coordinator use case.
pub trait BindingRepository: Send + Sync {
    async fn get(&self, user_id: i64) -> Result<Option<TelegramBinding>, AuthServiceError>;

    /// Create the cleared placeholder row at registration.
    async fn create_empty(&self, user_id: i64) -> Result<(), AuthServiceError>;

    /// One atomic clear-then-assign attempt: release `chat_id` from any
    /// other user's row, then upsert this user's row as verified with a
    /// fresh link timestamp — all in a single transaction.
    async fn assign_chat(
        &self,
        user_id: i64,
        chat_id: &str,
        telegram_username: Option<&str>,
    ) -> Result<TelegramBinding, AssignChatError>;

    /// Clear `chat_id` from whichever row holds it, except `except_user_id`.
    /// Used by the coordinator between bind retries.
    async fn clear_chat_owner(
        &self,
        chat_id: &str,
        except_user_id: i64,
    ) -> Result<(), AuthServiceError>;

    /// Unconditionally clear the subject's own binding fields. Idempotent.
    async fn revoke(&self, user_id: i64) -> Result<(), AuthServiceError>;

    /// Find the subject holding `chat_id` with a verified binding.
    async fn find_user_by_chat(&self, chat_id: &str) -> Result<Option<i64>, AuthServiceError>;
}

/// Repository for one-time code challenges.
pub trait OtpChallengeRepository: Send + Sync {
    async fn create(&self, challenge: &OtpChallenge) -> Result<(), AuthServiceError>;

    async fn get(&self, id: Uuid) -> Result<Option<OtpChallenge>, AuthServiceError>;

    /// Conditionally mark the challenge used. Returns `false` when the
    /// record was already consumed — the single-use race has one winner.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository for Telegram link tokens.
pub trait LinkTokenRepository: Send + Sync {
    async fn create(&self, token: &LinkToken) -> Result<(), AuthServiceError>;

    /// Unused, unexpired rows matching the deterministic index.
    async fn find_by_index(&self, token_index: &str) -> Result<Vec<LinkToken>, AuthServiceError>;

    /// All unused, unexpired rows — the scan fallback when the index is
    /// stale or ambiguous.
    async fn find_active(&self) -> Result<Vec<LinkToken>, AuthServiceError>;

    /// Conditionally mark the token used; `false` means lost the race.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Repository for single-use recovery codes.
pub trait RecoveryCodeRepository: Send + Sync {
    async fn add_batch(&self, codes: &[RecoveryCode]) -> Result<(), AuthServiceError>;

    /// Total codes ever issued to the user, spent or not. First-bind
    /// detection keys off this.
    async fn count_for_user(&self, user_id: i64) -> Result<u64, AuthServiceError>;

    /// Unused rows for the subject matching the deterministic index.
    async fn find_by_index(
        &self,
        user_id: i64,
        code_index: &str,
    ) -> Result<Vec<RecoveryCode>, AuthServiceError>;

    /// All unused rows for the subject — the scan fallback.
    async fn find_unused(&self, user_id: i64) -> Result<Vec<RecoveryCode>, AuthServiceError>;

    /// Conditionally mark the code used; `false` means lost the race.
    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError>;
}

/// Port for outbound Telegram delivery. Best-effort by contract: a failed
/// send is logged and reported as `false`, never an error, so issuing
/// flows stay usable when Telegram is down.
pub trait MessengerPort: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> bool;

    /// Deep link a user can open to hand the token to the bot, when a bot
    /// username is configured.
    fn deep_link(&self, token: &str) -> Option<String>;
}
