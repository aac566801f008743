pub mod link_tokens;
pub mod otp_challenges;
pub mod recovery_codes;
pub mod telegram_credentials;
pub mod users;
