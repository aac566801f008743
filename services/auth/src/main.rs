use sea_orm::Database;
use tracing::info;

use doorman_auth::config::AuthConfig;
use doorman_auth::crypto::{DeterministicIndexer, SecretHasher};
use doorman_auth::infra::telegram::TelegramMessenger;
use doorman_auth::router::build_router;
use doorman_auth::state::AppState;

#[tokio::main]
async fn main() {
    doorman_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Missing keying material is a startup failure, never a runtime
    // fallback: an unkeyed index would silently degrade every lookup.
    let indexer = DeterministicIndexer::new(config.index_key()).expect("index keying secret");

    let messenger = TelegramMessenger::new(
        config.telegram_bot_token.clone(),
        config.telegram_bot_username.clone(),
    );
    if config.telegram_bot_token.is_none() {
        info!("telegram delivery disabled (no TELEGRAM_BOT_TOKEN)");
    }

    let state = AppState {
        db,
        hasher: SecretHasher::default(),
        indexer,
        messenger,
        jwt_secret: config.jwt_secret.clone(),
        debug_otp: config.debug_otp,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
