use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::OtpContext;
use crate::error::AuthServiceError;
use crate::handlers::otp::ChallengeResponse;
use crate::state::AppState;
use crate::usecase::otp::{
    LoginVerifyInput, LoginVerifyUseCase, StartOtpInput, StartOtpUseCase,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// First login factor: password check, then a `login` OTP challenge.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
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
            context: OtpContext::Login,
        })
        .await?;
    Ok(Json(ChallengeResponse::from_output(&state, out)))
}

#[derive(Deserialize)]
pub struct LoginVerifyRequest {
    pub challenge_id: Uuid,
    pub code: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: i64,
    pub token: String,
    pub expires_at: u64,
}

/// Second login factor: consume the challenge, mint the session credential.
pub async fn verify_login(
    State(state): State<AppState>,
    Json(body): Json<LoginVerifyRequest>,
) -> Result<Json<SessionResponse>, AuthServiceError> {
    let usecase = LoginVerifyUseCase {
        otps: state.otp_repo(),
        users: state.user_repo(),
        hasher: state.hasher.clone(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(LoginVerifyInput {
            challenge_id: body.challenge_id,
            code: body.code,
        })
        .await?;
    Ok(Json(SessionResponse {
        user_id: out.user.id,
        token: out.session_token,
        expires_at: out.session_expires,
    }))
}
