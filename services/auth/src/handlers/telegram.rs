use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::types::OtpContext;
use crate::error::AuthServiceError;
use crate::handlers::otp::ChallengeResponse;
use crate::state::AppState;
use crate::usecase::binding::TelegramChangeConfirmUseCase;
use crate::usecase::otp::{StartOtpInput, StartOtpUseCase};

#[derive(Deserialize)]
pub struct ChangeStartRequest {
    pub identifier: String,
    pub password: String,
}

/// Re-authenticate before replacing a Telegram binding. The challenge is
/// delivered to the *old* chat when one is linked.
pub async fn start_telegram_change(
    State(state): State<AppState>,
    Json(body): Json<ChangeStartRequest>,
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
            context: OtpContext::TelegramChange,
        })
        .await?;
    Ok(Json(ChallengeResponse::from_output(&state, out)))
}

#[derive(Deserialize)]
pub struct ChangeConfirmRequest {
    pub challenge_id: Uuid,
    pub code: String,
}

/// Consume the `telegram_change` challenge and revoke the old binding.
/// The subject then initiates linking with the new chat.
pub async fn confirm_telegram_change(
    State(state): State<AppState>,
    Json(body): Json<ChangeConfirmRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = TelegramChangeConfirmUseCase {
        otps: state.otp_repo(),
        bindings: state.binding_repo(),
        hasher: state.hasher.clone(),
    };
    usecase.execute(body.challenge_id, &body.code).await?;
    Ok(StatusCode::NO_CONTENT)
}
