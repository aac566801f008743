use chrono::Utc;
use rand::RngExt;
use uuid::Uuid;

use crate::crypto::{DeterministicIndexer, SecretHasher};
use crate::domain::lifecycle::ConsumeError;
use crate::domain::repository::{BindingRepository, RecoveryCodeRepository, UserRepository};
use crate::domain::types::{RECOVERY_BATCH_SIZE, RecoveryCode};
use crate::error::AuthServiceError;

/// Charset without 0/O/1/I so codes survive being read aloud or written down.
const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn code_group(rng: &mut impl RngExt, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    format!("RC-{}-{}", code_group(&mut rng, 4), code_group(&mut rng, 4))
}

/// Issue a batch of recovery codes for a subject. The returned plaintexts
/// leave the process exactly once, here; only digests and lookup indexes
/// are stored.
pub(crate) async fn issue_recovery_batch<R>(
    codes: &R,
    hasher: &SecretHasher,
    indexer: &DeterministicIndexer,
    user_id: i64,
) -> Result<Vec<String>, AuthServiceError>
where
    R: RecoveryCodeRepository,
{
    let now = Utc::now();
    let mut plaintexts = Vec::with_capacity(RECOVERY_BATCH_SIZE);
    let mut records = Vec::with_capacity(RECOVERY_BATCH_SIZE);
    for _ in 0..RECOVERY_BATCH_SIZE {
        let code = generate_code();
        records.push(RecoveryCode {
            id: Uuid::new_v4(),
            user_id,
            code_digest: hasher.digest(&code)?,
            code_index: indexer.index(&code),
            used_at: None,
            created_at: now,
        });
        plaintexts.push(code);
    }
    codes.add_batch(&records).await?;
    Ok(plaintexts)
}

// ── Account recovery ─────────────────────────────────────────────────────────

pub struct RecoverInput {
    pub identifier: String,
    pub recovery_code: String,
}

/// Spend a recovery code in place of password + OTP, then revoke the
/// Telegram binding to force the subject through linking again.
pub struct RecoverUseCase<U, R, B>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
    B: BindingRepository,
{
    pub users: U,
    pub codes: R,
    pub bindings: B,
    pub hasher: SecretHasher,
    pub indexer: DeterministicIndexer,
}

impl<U, R, B> RecoverUseCase<U, R, B>
where
    U: UserRepository,
    R: RecoveryCodeRepository,
    B: BindingRepository,
{
    pub async fn execute(&self, input: RecoverInput) -> Result<i64, AuthServiceError> {
        let user = self
            .users
            .find_by_identifier(&input.identifier)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        // Narrow candidates by deterministic index; anything but exactly
        // one hit degrades to the per-subject scan.
        let index = self.indexer.index(&input.recovery_code);
        let candidates = self.codes.find_by_index(user.id, &index).await?;
        let candidates = if candidates.len() == 1 {
            candidates
        } else {
            self.codes.find_unused(user.id).await?
        };

        let Some(matched) = candidates
            .into_iter()
            .find(|c| self.hasher.verify(&input.recovery_code, &c.code_digest))
        else {
            return Err(ConsumeError::NotFound.into());
        };

        if !self.codes.consume(matched.id).await? {
            return Err(ConsumeError::AlreadyUsed.into());
        }

        self.bindings.revoke(user.id).await?;
        Ok(user.id)
    }
}
