use chrono::{Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use crate::crypto::{DeterministicIndexer, SecretHasher};
use crate::domain::lifecycle::ConsumeError;
use crate::domain::repository::{BindingRepository, LinkTokenRepository, RecoveryCodeRepository};
use crate::domain::types::{LINK_TOKEN_BYTES, LINK_TOKEN_TTL_SECS, LinkToken};
use crate::error::AuthServiceError;
use crate::usecase::binding::BindTelegramUseCase;
use crate::usecase::recovery::issue_recovery_batch;

const HEX_CHARSET: &[u8] = b"0123456789abcdef";

fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..LINK_TOKEN_BYTES * 2)
        .map(|_| HEX_CHARSET[rng.random_range(0..HEX_CHARSET.len())] as char)
        .collect()
}

// ── Start linking ────────────────────────────────────────────────────────────

pub struct LinkStartOutput {
    /// Plaintext token, returned to the caller exactly once.
    pub token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

pub struct LinkStartUseCase<L>
where
    L: LinkTokenRepository,
{
    pub links: L,
    pub hasher: SecretHasher,
    pub indexer: DeterministicIndexer,
}

impl<L> LinkStartUseCase<L>
where
    L: LinkTokenRepository,
{
    pub async fn execute(&self, user_id: i64) -> Result<LinkStartOutput, AuthServiceError> {
        let token = generate_token();
        let now = Utc::now();
        let record = LinkToken {
            id: Uuid::new_v4(),
            user_id,
            token_digest: self.hasher.digest(&token)?,
            token_index: self.indexer.index(&token),
            expires_at: now + Duration::seconds(LINK_TOKEN_TTL_SECS),
            used_at: None,
            created_at: now,
        };
        self.links.create(&record).await?;
        Ok(LinkStartOutput {
            token,
            expires_at: record.expires_at,
        })
    }
}

// ── Confirm linking (token presented back by the Telegram side) ──────────────

pub struct LinkConfirmInput {
    pub token: String,
    pub chat_id: String,
    pub telegram_username: Option<String>,
}

#[derive(Debug)]
pub struct LinkConfirmOutput {
    pub user_id: i64,
    /// Plaintext recovery codes, present only on the subject's first bind.
    pub recovery_codes: Option<Vec<String>>,
}

pub struct LinkConfirmUseCase<L, B, R>
where
    L: LinkTokenRepository,
    B: BindingRepository,
    R: RecoveryCodeRepository,
{
    pub links: L,
    pub binder: BindTelegramUseCase<B>,
    pub recovery: R,
    pub hasher: SecretHasher,
    pub indexer: DeterministicIndexer,
}

impl<L, B, R> LinkConfirmUseCase<L, B, R>
where
    L: LinkTokenRepository,
    B: BindingRepository,
    R: RecoveryCodeRepository,
{
    pub async fn execute(
        &self,
        input: LinkConfirmInput,
    ) -> Result<LinkConfirmOutput, AuthServiceError> {
        // Narrow candidates by deterministic index over unused, unexpired
        // tokens; zero or multiple hits degrade to the full scan.
        let index = self.indexer.index(&input.token);
        let candidates = self.links.find_by_index(&index).await?;
        let candidates = if candidates.len() == 1 {
            candidates
        } else {
            self.links.find_active().await?
        };

        // The index narrows, the salted digest decides.
        let Some(matched) = candidates
            .into_iter()
            .find(|t| self.hasher.verify(&input.token, &t.token_digest))
        else {
            return Err(ConsumeError::NotFound.into());
        };

        if !self.links.consume(matched.id).await? {
            return Err(ConsumeError::AlreadyUsed.into());
        }

        if let Some(previous) = self.binder.bindings.find_user_by_chat(&input.chat_id).await? {
            if previous != matched.user_id {
                tracing::info!(
                    chat_id = %input.chat_id,
                    from_user = previous,
                    to_user = matched.user_id,
                    "chat re-binding to a different account"
                );
            }
        }

        self.binder
            .execute(
                matched.user_id,
                &input.chat_id,
                input.telegram_username.as_deref(),
            )
            .await?;

        // First successful bind seeds the subject's recovery codes.
        let recovery_codes = if self.recovery.count_for_user(matched.user_id).await? == 0 {
            Some(
                issue_recovery_batch(
                    &self.recovery,
                    &self.hasher,
                    &self.indexer,
                    matched.user_id,
                )
                .await?,
            )
        } else {
            None
        };

        Ok(LinkConfirmOutput {
            user_id: matched.user_id,
            recovery_codes,
        })
    }
}
