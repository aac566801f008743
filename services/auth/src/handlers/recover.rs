use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::recovery::{RecoverInput, RecoverUseCase};

#[derive(Deserialize)]
pub struct RecoverRequest {
    pub identifier: String,
    pub recovery_code: String,
}

/// Spend a recovery code. On success the Telegram binding is revoked and
/// the subject must link again.
pub async fn recover(
    State(state): State<AppState>,
    Json(body): Json<RecoverRequest>,
) -> Result<StatusCode, AuthServiceError> {
    let usecase = RecoverUseCase {
        users: state.user_repo(),
        codes: state.recovery_code_repo(),
        bindings: state.binding_repo(),
        hasher: state.hasher.clone(),
        indexer: state.indexer.clone(),
    };
    usecase
        .execute(RecoverInput {
            identifier: body.identifier,
            recovery_code: body.recovery_code,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
