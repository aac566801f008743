use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::OtpContext;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::otp::{StartOtpInput, StartOtpOutput, StartOtpUseCase};

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub challenge_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub otp_sent: bool,
    /// Development side channel (`DEBUG_OTP=true`): lets flows complete
    /// without a working Telegram path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_otp: Option<String>,
}

impl ChallengeResponse {
    pub fn from_output(state: &AppState, out: StartOtpOutput) -> Self {
        Self {
            challenge_id: out.challenge_id,
            expires_at: out.expires_at,
            otp_sent: out.otp_sent,
            debug_otp: state.debug_otp.then_some(out.code),
        }
    }
}

#[derive(Deserialize)]
pub struct StartOtpRequest {
    pub identifier: String,
    pub password: String,
    pub context: OtpContext,
}

/// Issue a one-time code for an explicit context after re-validating the
/// password.
pub async fn start_otp(
    State(state): State<AppState>,
    Json(body): Json<StartOtpRequest>,
) -> Result<Json<ChallengeResponse>, AuthServiceError> {
    let usecase = StartOtpUseCase {
        users: state.user_repo(),
        otps: state.otp_repo(),
        bindings: state.binding_repo(),
        messenger: state.messenger.clone(),
        hasher: state.hasher.clone(),
    };
    let out = usecase
        .execute(StartOtpInput {
            identifier: body.identifier,
            password: body.password,
            context: body.context,
        })
        .await?;
    Ok(Json(ChallengeResponse::from_output(&state, out)))
}
