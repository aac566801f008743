use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use doorman_auth::crypto::{DeterministicIndexer, SecretHasher};
use doorman_auth::domain::repository::{
    AssignChatError, BindingRepository, LinkTokenRepository, MessengerPort,
    OtpChallengeRepository, RecoveryCodeRepository, UserRepository,
};
use doorman_auth::domain::types::{
    LinkToken, OtpChallenge, OtpContext, RecoveryCode, TelegramBinding, User,
};
use doorman_auth::error::AuthServiceError;

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-unit-tests-only";

/// Hasher with the cheapest argon2 parameters so tests stay fast.
pub fn fast_hasher() -> SecretHasher {
    SecretHasher::new(argon2::Params::new(8, 1, 1, None).unwrap())
}

pub fn test_indexer() -> DeterministicIndexer {
    DeterministicIndexer::new("test-index-key").unwrap()
}

pub fn test_user(id: i64, hasher: &SecretHasher) -> User {
    let now = Utc::now();
    User {
        id,
        email: format!("user{id}@example.com"),
        username: format!("user{id}"),
        password_digest: hasher.digest(TEST_PASSWORD).unwrap(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn linked_binding(user_id: i64, chat_id: &str) -> TelegramBinding {
    TelegramBinding {
        user_id,
        chat_id: Some(chat_id.to_owned()),
        telegram_username: Some(format!("tg_user{user_id}")),
        is_verified: true,
        linked_at: Some(Utc::now()),
    }
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }
}

impl UserRepository for MockUserRepo {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_digest: &str,
    ) -> Result<User, AuthServiceError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.email == email || u.username == username)
        {
            return Err(AuthServiceError::UserExists);
        }
        let now = Utc::now();
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_owned(),
            username: username.to_owned(),
            password_digest: password_digest.to_owned(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthServiceError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == identifier || u.username == identifier)
            .cloned())
    }
}

// ── MockBindingRepo ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockBindingRepo {
    pub rows: Arc<Mutex<Vec<TelegramBinding>>>,
    /// Number of upcoming `assign_chat` calls that report a unique-index
    /// violation, simulating a concurrent bind interleaving.
    pub unique_failures: Arc<AtomicUsize>,
}

impl MockBindingRepo {
    pub fn new(rows: Vec<TelegramBinding>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            unique_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn with_unique_failures(rows: Vec<TelegramBinding>, failures: usize) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            unique_failures: Arc::new(AtomicUsize::new(failures)),
        }
    }

    pub fn rows_handle(&self) -> Arc<Mutex<Vec<TelegramBinding>>> {
        Arc::clone(&self.rows)
    }
}

fn clear_row(row: &mut TelegramBinding) {
    row.chat_id = None;
    row.telegram_username = None;
    row.is_verified = false;
    row.linked_at = None;
}

impl BindingRepository for MockBindingRepo {
    async fn get(&self, user_id: i64) -> Result<Option<TelegramBinding>, AuthServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    async fn create_empty(&self, user_id: i64) -> Result<(), AuthServiceError> {
        let mut rows = self.rows.lock().unwrap();
        if !rows.iter().any(|b| b.user_id == user_id) {
            rows.push(TelegramBinding::empty(user_id));
        }
        Ok(())
    }

    async fn assign_chat(
        &self,
        user_id: i64,
        chat_id: &str,
        telegram_username: Option<&str>,
    ) -> Result<TelegramBinding, AssignChatError> {
        if self.unique_failures.load(Ordering::SeqCst) > 0 {
            self.unique_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(AssignChatError::UniqueViolation);
        }
        // The mutex stands in for the store transaction: clear-then-assign
        // is atomic with respect to other mock calls.
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if row.user_id != user_id && row.chat_id.as_deref() == Some(chat_id) {
                clear_row(row);
            }
        }
        let now = Utc::now();
        let binding = match rows.iter_mut().find(|b| b.user_id == user_id) {
            Some(row) => {
                row.chat_id = Some(chat_id.to_owned());
                row.telegram_username = telegram_username.map(str::to_owned);
                row.is_verified = true;
                row.linked_at = Some(now);
                row.clone()
            }
            None => {
                let row = TelegramBinding {
                    user_id,
                    chat_id: Some(chat_id.to_owned()),
                    telegram_username: telegram_username.map(str::to_owned),
                    is_verified: true,
                    linked_at: Some(now),
                };
                rows.push(row.clone());
                row
            }
        };
        Ok(binding)
    }

    async fn clear_chat_owner(
        &self,
        chat_id: &str,
        except_user_id: i64,
    ) -> Result<(), AuthServiceError> {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut() {
            if row.user_id != except_user_id && row.chat_id.as_deref() == Some(chat_id) {
                clear_row(row);
            }
        }
        Ok(())
    }

    async fn revoke(&self, user_id: i64) -> Result<(), AuthServiceError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|b| b.user_id == user_id) {
            clear_row(row);
        }
        Ok(())
    }

    async fn find_user_by_chat(&self, chat_id: &str) -> Result<Option<i64>, AuthServiceError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.is_verified && b.chat_id.as_deref() == Some(chat_id))
            .map(|b| b.user_id))
    }
}

// ── MockOtpRepo ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockOtpRepo {
    pub challenges: Arc<Mutex<Vec<OtpChallenge>>>,
}

impl MockOtpRepo {
    pub fn new(challenges: Vec<OtpChallenge>) -> Self {
        Self {
            challenges: Arc::new(Mutex::new(challenges)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn challenges_handle(&self) -> Arc<Mutex<Vec<OtpChallenge>>> {
        Arc::clone(&self.challenges)
    }
}

impl OtpChallengeRepository for MockOtpRepo {
    async fn create(&self, challenge: &OtpChallenge) -> Result<(), AuthServiceError> {
        self.challenges.lock().unwrap().push(challenge.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OtpChallenge>, AuthServiceError> {
        Ok(self
            .challenges
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        // Conditional update under the lock: exactly one caller flips it.
        let mut challenges = self.challenges.lock().unwrap();
        match challenges.iter_mut().find(|c| c.id == id) {
            Some(c) if c.used_at.is_none() => {
                c.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn test_challenge(
    user_id: i64,
    code: &str,
    context: OtpContext,
    hasher: &SecretHasher,
) -> OtpChallenge {
    let now = Utc::now();
    OtpChallenge {
        id: Uuid::new_v4(),
        user_id,
        code_digest: hasher.digest(code).unwrap(),
        context,
        expires_at: now + chrono::Duration::seconds(120),
        used_at: None,
        created_at: now,
    }
}

// ── MockLinkTokenRepo ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockLinkTokenRepo {
    pub tokens: Arc<Mutex<Vec<LinkToken>>>,
}

impl MockLinkTokenRepo {
    pub fn new(tokens: Vec<LinkToken>) -> Self {
        Self {
            tokens: Arc::new(Mutex::new(tokens)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn tokens_handle(&self) -> Arc<Mutex<Vec<LinkToken>>> {
        Arc::clone(&self.tokens)
    }
}

fn link_token_live(token: &LinkToken) -> bool {
    token.used_at.is_none() && token.expires_at > Utc::now()
}

impl LinkTokenRepository for MockLinkTokenRepo {
    async fn create(&self, token: &LinkToken) -> Result<(), AuthServiceError> {
        self.tokens.lock().unwrap().push(token.clone());
        Ok(())
    }

    async fn find_by_index(&self, token_index: &str) -> Result<Vec<LinkToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.token_index == token_index && link_token_live(t))
            .cloned()
            .collect())
    }

    async fn find_active(&self) -> Result<Vec<LinkToken>, AuthServiceError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .filter(|t| link_token_live(t))
            .cloned()
            .collect())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.iter_mut().find(|t| t.id == id) {
            Some(t) if t.used_at.is_none() => {
                t.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ── MockRecoveryCodeRepo ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockRecoveryCodeRepo {
    pub codes: Arc<Mutex<Vec<RecoveryCode>>>,
}

impl MockRecoveryCodeRepo {
    pub fn new(codes: Vec<RecoveryCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn codes_handle(&self) -> Arc<Mutex<Vec<RecoveryCode>>> {
        Arc::clone(&self.codes)
    }
}

impl RecoveryCodeRepository for MockRecoveryCodeRepo {
    async fn add_batch(&self, codes: &[RecoveryCode]) -> Result<(), AuthServiceError> {
        self.codes.lock().unwrap().extend_from_slice(codes);
        Ok(())
    }

    async fn count_for_user(&self, user_id: i64) -> Result<u64, AuthServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id)
            .count() as u64)
    }

    async fn find_by_index(
        &self,
        user_id: i64,
        code_index: &str,
    ) -> Result<Vec<RecoveryCode>, AuthServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.code_index == code_index && c.used_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_unused(&self, user_id: i64) -> Result<Vec<RecoveryCode>, AuthServiceError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.used_at.is_none())
            .cloned()
            .collect())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let mut codes = self.codes.lock().unwrap();
        match codes.iter_mut().find(|c| c.id == id) {
            Some(c) if c.used_at.is_none() => {
                c.used_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ── MockMessenger ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockMessenger {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: false,
        }
    }

    /// A messenger whose deliveries always fail, like a down Telegram API.
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(vec![])),
            fail: true,
        }
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.sent)
    }
}

impl MessengerPort for MockMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> bool {
        if self.fail {
            return false;
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_owned(), text.to_owned()));
        true
    }

    fn deep_link(&self, token: &str) -> Option<String> {
        Some(format!("https://t.me/test_bot?start={token}"))
    }
}
