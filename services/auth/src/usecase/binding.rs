use uuid::Uuid;

use crate::crypto::SecretHasher;
use crate::domain::repository::{AssignChatError, BindingRepository, OtpChallengeRepository};
use crate::domain::types::{OtpContext, TelegramBinding};
use crate::error::AuthServiceError;
use crate::usecase::otp::verify_and_consume;

/// Binding coordinator: gives a Telegram chat to exactly one account.
///
/// One transactional clear-then-assign attempt, then — if the chat-id
/// unique constraint still fired because a concurrent bind interleaved —
/// clear the conflicting owner and retry exactly once. A second failure
/// surfaces as `BindingConflict`; three-way contention is the caller's
/// problem to retry.
pub struct BindTelegramUseCase<B>
where
    B: BindingRepository,
{
    pub bindings: B,
}

impl<B> BindTelegramUseCase<B>
where
    B: BindingRepository,
{
    pub async fn execute(
        &self,
        user_id: i64,
        chat_id: &str,
        telegram_username: Option<&str>,
    ) -> Result<TelegramBinding, AuthServiceError> {
        match self
            .bindings
            .assign_chat(user_id, chat_id, telegram_username)
            .await
        {
            Ok(binding) => Ok(binding),
            Err(AssignChatError::Store(e)) => Err(e),
            Err(AssignChatError::UniqueViolation) => {
                tracing::warn!(chat_id, "chat unique constraint raced, retrying bind once");
                self.bindings.clear_chat_owner(chat_id, user_id).await?;
                match self
                    .bindings
                    .assign_chat(user_id, chat_id, telegram_username)
                    .await
                {
                    Ok(binding) => Ok(binding),
                    Err(AssignChatError::UniqueViolation) => Err(AuthServiceError::BindingConflict),
                    Err(AssignChatError::Store(e)) => Err(e),
                }
            }
        }
    }
}

// ── Telegram change (re-authenticate, then drop the old binding) ─────────────

pub struct TelegramChangeConfirmUseCase<O, B>
where
    O: OtpChallengeRepository,
    B: BindingRepository,
{
    pub otps: O,
    pub bindings: B,
    pub hasher: SecretHasher,
}

impl<O, B> TelegramChangeConfirmUseCase<O, B>
where
    O: OtpChallengeRepository,
    B: BindingRepository,
{
    /// Consume a `telegram_change` challenge and revoke the subject's
    /// current binding so a fresh link can be initiated.
    pub async fn execute(&self, challenge_id: Uuid, code: &str) -> Result<i64, AuthServiceError> {
        let user_id = verify_and_consume(
            &self.otps,
            &self.hasher,
            challenge_id,
            code,
            OtpContext::TelegramChange,
        )
        .await?;

        self.bindings.revoke(user_id).await?;
        Ok(user_id)
    }
}
