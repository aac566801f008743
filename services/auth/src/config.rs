/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session JWTs.
    pub jwt_secret: String,
    /// Keying secret for the deterministic lookup index. Optional; falls
    /// back to `jwt_secret` (see `index_key`).
    pub index_hmac_secret: Option<String>,
    /// Telegram bot API token. Absent means OTP/link delivery is disabled
    /// and flows rely on the direct response instead.
    pub telegram_bot_token: Option<String>,
    /// Bot username used to build `https://t.me/<bot>?start=<token>` deep links.
    pub telegram_bot_username: Option<String>,
    /// When true, issuing endpoints echo the plaintext OTP in the response.
    /// Never enable outside development. Env var: `DEBUG_OTP`.
    pub debug_otp: bool,
    /// TCP port to listen on (default 3114). Env var: `AUTH_PORT`.
    pub auth_port: u16,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            index_hmac_secret: std::env::var("INDEX_HMAC_SECRET").ok(),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_bot_username: std::env::var("TELEGRAM_BOT_USERNAME").ok(),
            debug_otp: std::env::var("DEBUG_OTP").is_ok_and(|v| v == "true"),
            auth_port: std::env::var("AUTH_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
        }
    }

    /// Key material for the deterministic indexer. Distinct in purpose from
    /// the signing secret but allowed to share material with it.
    pub fn index_key(&self) -> &str {
        self.index_hmac_secret.as_deref().unwrap_or(&self.jwt_secret)
    }
}
