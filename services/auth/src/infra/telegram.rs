use crate::domain::repository::MessengerPort;

/// Telegram Bot API client for outbound delivery.
///
/// Constructed without a token it becomes a no-op: every send reports
/// `false` and flows fall back to the direct response. Delivery failures
/// are never fatal — the issuing side's response is the source of truth.
#[derive(Clone)]
pub struct TelegramMessenger {
    client: reqwest::Client,
    bot_token: Option<String>,
    bot_username: Option<String>,
}

impl TelegramMessenger {
    pub fn new(bot_token: Option<String>, bot_username: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            bot_username,
        }
    }
}

impl MessengerPort for TelegramMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> bool {
        let Some(token) = &self.bot_token else {
            tracing::debug!("telegram bot token not configured, skipping delivery");
            return false;
        };
        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let body = serde_json::json!({ "chat_id": chat_id, "text": text });
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "telegram sendMessage rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "telegram sendMessage failed");
                false
            }
        }
    }

    fn deep_link(&self, token: &str) -> Option<String> {
        self.bot_username
            .as_ref()
            .map(|bot| format!("https://t.me/{bot}?start={token}"))
    }
}
