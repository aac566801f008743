use chrono::{Duration, Utc};
use rand::RngExt;
use uuid::Uuid;

use crate::crypto::SecretHasher;
use crate::domain::lifecycle::ConsumeError;
use crate::domain::repository::{
    BindingRepository, MessengerPort, OtpChallengeRepository, UserRepository,
};
use crate::domain::types::{OTP_LEN, OTP_TTL_SECS, OtpChallenge, OtpContext, TelegramBinding, User};
use crate::error::AuthServiceError;
use crate::usecase::session::issue_session_token;

const DIGITS: &[u8] = b"0123456789";

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..OTP_LEN)
        .map(|_| DIGITS[rng.random_range(0..DIGITS.len())] as char)
        .collect()
}

/// Shared verify-and-consume for one-time code challenges. Rejection order
/// is fixed (existence, used, expiry, digest) and the conditional consume
/// admits exactly one winner under concurrent attempts. Returns the
/// challenge's subject.
pub(crate) async fn verify_and_consume<O>(
    otps: &O,
    hasher: &SecretHasher,
    challenge_id: Uuid,
    code: &str,
    context: OtpContext,
) -> Result<i64, AuthServiceError>
where
    O: OtpChallengeRepository,
{
    let Some(challenge) = otps.get(challenge_id).await? else {
        return Err(ConsumeError::NotFound.into());
    };
    // A challenge issued for one context cannot be replayed in another.
    if challenge.context != context {
        return Err(ConsumeError::NotFound.into());
    }
    if challenge.used_at.is_some() {
        return Err(ConsumeError::AlreadyUsed.into());
    }
    if challenge.expires_at <= Utc::now() {
        return Err(ConsumeError::Expired.into());
    }
    if !hasher.verify(code, &challenge.code_digest) {
        return Err(ConsumeError::SecretMismatch.into());
    }
    if !otps.consume(challenge.id).await? {
        return Err(ConsumeError::AlreadyUsed.into());
    }
    Ok(challenge.user_id)
}

// ── Start OTP (password validation + challenge issue) ────────────────────────

pub struct StartOtpInput {
    pub identifier: String,
    pub password: String,
    pub context: OtpContext,
}

#[derive(Debug)]
pub struct StartOtpOutput {
    pub challenge_id: Uuid,
    pub expires_at: chrono::DateTime<Utc>,
    pub otp_sent: bool,
    /// Plaintext code, for delivery and (in development) the debug side
    /// channel. Never persisted or logged.
    pub code: String,
}

pub struct StartOtpUseCase<U, O, B, M>
where
    U: UserRepository,
    O: OtpChallengeRepository,
    B: BindingRepository,
    M: MessengerPort,
{
    pub users: U,
    pub otps: O,
    pub bindings: B,
    pub messenger: M,
    pub hasher: SecretHasher,
}

impl<U, O, B, M> StartOtpUseCase<U, O, B, M>
where
    U: UserRepository,
    O: OtpChallengeRepository,
    B: BindingRepository,
    M: MessengerPort,
{
    pub async fn execute(&self, input: StartOtpInput) -> Result<StartOtpOutput, AuthServiceError> {
        // Unknown identifier, inactive account, and wrong password are the
        // same outcome on the wire.
        let user = self
            .users
            .find_by_identifier(&input.identifier)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;
        if !user.is_active {
            return Err(AuthServiceError::InvalidCredentials);
        }
        if !self.hasher.verify(&input.password, &user.password_digest) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let code = generate_code();
        let now = Utc::now();
        let challenge = OtpChallenge {
            id: Uuid::new_v4(),
            user_id: user.id,
            code_digest: self.hasher.digest(&code)?,
            context: input.context,
            expires_at: now + Duration::seconds(OTP_TTL_SECS),
            used_at: None,
            created_at: now,
        };
        self.otps.create(&challenge).await?;

        let otp_sent = self.deliver(&user, input.context, &code).await?;

        Ok(StartOtpOutput {
            challenge_id: challenge.id,
            expires_at: challenge.expires_at,
            otp_sent,
            code,
        })
    }

    /// Telegram delivery when a verified binding exists. Delivery itself is
    /// best-effort; the binding lookup is a store read and fails like one.
    async fn deliver(
        &self,
        user: &User,
        context: OtpContext,
        code: &str,
    ) -> Result<bool, AuthServiceError> {
        match self.bindings.get(user.id).await? {
            Some(TelegramBinding {
                chat_id: Some(chat),
                is_verified: true,
                ..
            }) => {
                let text = format!("Your one-time code for {}: {code}", context.as_str());
                Ok(self.messenger.send_text(&chat, &text).await)
            }
            _ => Ok(false),
        }
    }
}

// ── Verify login OTP (issues the session credential) ─────────────────────────

pub struct LoginVerifyInput {
    pub challenge_id: Uuid,
    pub code: String,
}

#[derive(Debug)]
pub struct LoginVerifyOutput {
    pub user: User,
    pub session_token: String,
    pub session_expires: u64,
}

pub struct LoginVerifyUseCase<O, U>
where
    O: OtpChallengeRepository,
    U: UserRepository,
{
    pub otps: O,
    pub users: U,
    pub hasher: SecretHasher,
    pub jwt_secret: String,
}

impl<O, U> LoginVerifyUseCase<O, U>
where
    O: OtpChallengeRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        input: LoginVerifyInput,
    ) -> Result<LoginVerifyOutput, AuthServiceError> {
        let user_id = verify_and_consume(
            &self.otps,
            &self.hasher,
            input.challenge_id,
            &input.code,
            OtpContext::Login,
        )
        .await?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let (session_token, session_expires) = issue_session_token(user.id, &self.jwt_secret)?;

        Ok(LoginVerifyOutput {
            user,
            session_token,
            session_expires,
        })
    }
}
