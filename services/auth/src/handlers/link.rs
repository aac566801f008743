use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::repository::MessengerPort;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::binding::BindTelegramUseCase;
use crate::usecase::link::{LinkConfirmInput, LinkConfirmUseCase, LinkStartUseCase};
use crate::usecase::session::validate_session_token;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[derive(Serialize)]
pub struct LinkStartResponse {
    pub link_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
}

/// Issue a link token for the authenticated subject. The token travels to
/// Telegram out-of-band (deep link) and comes back via `confirm_link`.
pub async fn start_link(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LinkStartResponse>, AuthServiceError> {
    let token_value = bearer_token(&headers).ok_or(AuthServiceError::InvalidCredentials)?;
    let user_id = validate_session_token(token_value, &state.jwt_secret)?;

    let usecase = LinkStartUseCase {
        links: state.link_token_repo(),
        hasher: state.hasher.clone(),
        indexer: state.indexer.clone(),
    };
    let out = usecase.execute(user_id).await?;
    let link_url = state.messenger.deep_link(&out.token);

    Ok(Json(LinkStartResponse {
        link_token: out.token,
        expires_at: out.expires_at,
        link_url,
    }))
}

#[derive(Deserialize)]
pub struct LinkConfirmRequest {
    pub token: String,
    pub chat_id: String,
    pub telegram_username: Option<String>,
}

#[derive(Serialize)]
pub struct LinkConfirmResponse {
    pub user_id: i64,
    /// Present only on the subject's first bind; shown once, never again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_codes: Option<Vec<String>>,
}

/// Called by the Telegram-facing side when a chat presents a link token.
pub async fn confirm_link(
    State(state): State<AppState>,
    Json(body): Json<LinkConfirmRequest>,
) -> Result<Json<LinkConfirmResponse>, AuthServiceError> {
    let usecase = LinkConfirmUseCase {
        links: state.link_token_repo(),
        binder: BindTelegramUseCase {
            bindings: state.binding_repo(),
        },
        recovery: state.recovery_code_repo(),
        hasher: state.hasher.clone(),
        indexer: state.indexer.clone(),
    };
    let out = usecase
        .execute(LinkConfirmInput {
            token: body.token,
            chat_id: body.chat_id,
            telegram_username: body.telegram_username,
        })
        .await?;
    Ok(Json(LinkConfirmResponse {
        user_id: out.user_id,
        recovery_codes: out.recovery_codes,
    }))
}
