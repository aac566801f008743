use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
///
/// `InvalidOrExpired` is deliberately coarse: not-found, already-used,
/// expired, and digest-mismatch all collapse into it before leaving the
/// service, so a caller cannot tell a wrong code from a spent one.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired code")]
    InvalidOrExpired,
    #[error("telegram binding conflict")]
    BindingConflict,
    #[error("missing configuration: {0}")]
    NotConfigured(&'static str),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserExists => "USER_EXISTS",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidOrExpired => "INVALID_OR_EXPIRED",
            Self::BindingConflict => "BINDING_CONFLICT",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::UserExists | Self::BindingConflict => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::InvalidOrExpired => StatusCode::UNAUTHORIZED,
            Self::NotConfigured(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client outcomes and stay quiet; the remaining
        // variants are operator problems and need the chain in the log.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            Self::BindingConflict => {
                tracing::error!(kind = "BINDING_CONFLICT", "bind retry exhausted");
            }
            Self::NotConfigured(what) => {
                tracing::error!(kind = "NOT_CONFIGURED", missing = %what, "misconfiguration");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
