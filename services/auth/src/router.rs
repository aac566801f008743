use axum::{Router, routing::get, routing::post};
use tower_http::trace::TraceLayer;

use doorman_core::health::{healthz, readyz};
use doorman_core::middleware::request_id_layer;

use crate::handlers::{
    link::{confirm_link, start_link},
    login::{login, verify_login},
    otp::start_otp,
    recover::recover,
    register::register,
    telegram::{confirm_telegram_change, start_telegram_change},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Accounts
        .route("/auth/register", post(register))
        // Login (password + OTP)
        .route("/auth/login", post(login))
        .route("/auth/login/verify", post(verify_login))
        // Explicit-context OTP (sensitive operations)
        .route("/auth/otp", post(start_otp))
        // Telegram linking
        .route("/auth/link", post(start_link))
        .route("/auth/link/confirm", post(confirm_link))
        // Telegram change
        .route("/auth/telegram/change", post(start_telegram_change))
        .route("/auth/telegram/change/confirm", post(confirm_telegram_change))
        // Recovery
        .route("/auth/recover", post(recover))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
