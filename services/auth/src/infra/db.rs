use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel as _, PaginatorTrait, QueryFilter, SqlErr, TransactionError, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use doorman_auth_schema::{link_tokens, otp_challenges, recovery_codes, telegram_credentials, users};

use crate::domain::repository::{
    AssignChatError, BindingRepository, LinkTokenRepository, OtpChallengeRepository,
    RecoveryCodeRepository, UserRepository,
};
use crate::domain::types::{LinkToken, OtpChallenge, OtpContext, RecoveryCode, TelegramBinding, User};
use crate::error::AuthServiceError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_digest: &str,
    ) -> Result<User, AuthServiceError> {
        let now = Utc::now();
        let result = users::ActiveModel {
            email: Set(email.to_owned()),
            username: Set(username.to_owned()),
            password_digest: Set(password_digest.to_owned()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(model) => Ok(user_from_model(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AuthServiceError::UserExists)
            }
            Err(e) => Err(AuthServiceError::Internal(
                anyhow::Error::new(e).context("create user"),
            )),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(identifier))
                    .add(users::Column::Username.eq(identifier)),
            )
            .one(&self.db)
            .await
            .context("find user by identifier")?;
        Ok(model.map(user_from_model))
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        username: model.username,
        password_digest: model.password_digest,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Binding repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbBindingRepository {
    pub db: DatabaseConnection,
}

impl BindingRepository for DbBindingRepository {
    async fn get(&self, user_id: i64) -> Result<Option<TelegramBinding>, AuthServiceError> {
        let model = telegram_credentials::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("get telegram binding")?;
        Ok(model.map(binding_from_model))
    }

    async fn create_empty(&self, user_id: i64) -> Result<(), AuthServiceError> {
        telegram_credentials::ActiveModel {
            user_id: Set(user_id),
            chat_id: Set(None),
            telegram_username: Set(None),
            is_verified: Set(false),
            linked_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("create empty telegram binding")?;
        Ok(())
    }

    async fn assign_chat(
        &self,
        user_id: i64,
        chat_id: &str,
        telegram_username: Option<&str>,
    ) -> Result<TelegramBinding, AssignChatError> {
        let chat = chat_id.to_owned();
        let tg_username = telegram_username.map(str::to_owned);
        let result = self
            .db
            .transaction::<_, telegram_credentials::Model, sea_orm::DbErr>(|txn| {
                let chat = chat.clone();
                let tg_username = tg_username.clone();
                Box::pin(async move {
                    // Release the chat from any other holder inside the same
                    // transaction, so no observer sees two owners and the
                    // unique index stays satisfiable for the assign below.
                    telegram_credentials::Entity::update_many()
                        .col_expr(
                            telegram_credentials::Column::ChatId,
                            Expr::value(Option::<String>::None),
                        )
                        .col_expr(
                            telegram_credentials::Column::TelegramUsername,
                            Expr::value(Option::<String>::None),
                        )
                        .col_expr(telegram_credentials::Column::IsVerified, Expr::value(false))
                        .col_expr(
                            telegram_credentials::Column::LinkedAt,
                            Expr::value(Option::<chrono::DateTime<Utc>>::None),
                        )
                        .filter(telegram_credentials::Column::ChatId.eq(chat.clone()))
                        .filter(telegram_credentials::Column::UserId.ne(user_id))
                        .exec(txn)
                        .await?;

                    let now = Utc::now();
                    let existing = telegram_credentials::Entity::find_by_id(user_id)
                        .one(txn)
                        .await?;
                    let model = match existing {
                        Some(model) => {
                            let mut am = model.into_active_model();
                            am.chat_id = Set(Some(chat));
                            am.telegram_username = Set(tg_username);
                            am.is_verified = Set(true);
                            am.linked_at = Set(Some(now));
                            am.update(txn).await?
                        }
                        None => {
                            telegram_credentials::ActiveModel {
                                user_id: Set(user_id),
                                chat_id: Set(Some(chat)),
                                telegram_username: Set(tg_username),
                                is_verified: Set(true),
                                linked_at: Set(Some(now)),
                            }
                            .insert(txn)
                            .await?
                        }
                    };
                    Ok(model)
                })
            })
            .await;

        match result {
            Ok(model) => Ok(binding_from_model(model)),
            Err(TransactionError::Transaction(e))
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                Err(AssignChatError::UniqueViolation)
            }
            Err(TransactionError::Transaction(e)) => Err(AssignChatError::Store(
                AuthServiceError::Internal(anyhow::Error::new(e).context("assign telegram chat")),
            )),
            Err(TransactionError::Connection(e)) => Err(AssignChatError::Store(
                AuthServiceError::Internal(anyhow::Error::new(e).context("assign telegram chat")),
            )),
        }
    }

    async fn clear_chat_owner(
        &self,
        chat_id: &str,
        except_user_id: i64,
    ) -> Result<(), AuthServiceError> {
        telegram_credentials::Entity::update_many()
            .col_expr(
                telegram_credentials::Column::ChatId,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                telegram_credentials::Column::TelegramUsername,
                Expr::value(Option::<String>::None),
            )
            .col_expr(telegram_credentials::Column::IsVerified, Expr::value(false))
            .col_expr(
                telegram_credentials::Column::LinkedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(telegram_credentials::Column::ChatId.eq(chat_id))
            .filter(telegram_credentials::Column::UserId.ne(except_user_id))
            .exec(&self.db)
            .await
            .context("clear conflicting chat owner")?;
        Ok(())
    }

    async fn revoke(&self, user_id: i64) -> Result<(), AuthServiceError> {
        telegram_credentials::Entity::update_many()
            .col_expr(
                telegram_credentials::Column::ChatId,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                telegram_credentials::Column::TelegramUsername,
                Expr::value(Option::<String>::None),
            )
            .col_expr(telegram_credentials::Column::IsVerified, Expr::value(false))
            .col_expr(
                telegram_credentials::Column::LinkedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(telegram_credentials::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("revoke telegram binding")?;
        Ok(())
    }

    async fn find_user_by_chat(&self, chat_id: &str) -> Result<Option<i64>, AuthServiceError> {
        let model = telegram_credentials::Entity::find()
            .filter(telegram_credentials::Column::ChatId.eq(chat_id))
            .filter(telegram_credentials::Column::IsVerified.eq(true))
            .one(&self.db)
            .await
            .context("find user by chat id")?;
        Ok(model.map(|m| m.user_id))
    }
}

fn binding_from_model(model: telegram_credentials::Model) -> TelegramBinding {
    TelegramBinding {
        user_id: model.user_id,
        chat_id: model.chat_id,
        telegram_username: model.telegram_username,
        is_verified: model.is_verified,
        linked_at: model.linked_at,
    }
}

// ── OTP challenge repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpChallengeRepository {
    pub db: DatabaseConnection,
}

impl OtpChallengeRepository for DbOtpChallengeRepository {
    async fn create(&self, challenge: &OtpChallenge) -> Result<(), AuthServiceError> {
        otp_challenges::ActiveModel {
            id: Set(challenge.id),
            user_id: Set(challenge.user_id),
            code_digest: Set(challenge.code_digest.clone()),
            context: Set(challenge.context.as_str().to_owned()),
            expires_at: Set(challenge.expires_at),
            used_at: Set(None),
            created_at: Set(challenge.created_at),
        }
        .insert(&self.db)
        .await
        .context("create otp challenge")?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OtpChallenge>, AuthServiceError> {
        let model = otp_challenges::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("get otp challenge")?;
        model.map(otp_from_model).transpose()
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let result = otp_challenges::Entity::update_many()
            .col_expr(otp_challenges::Column::UsedAt, Expr::value(Some(Utc::now())))
            .filter(otp_challenges::Column::Id.eq(id))
            .filter(otp_challenges::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume otp challenge")?;
        Ok(result.rows_affected == 1)
    }
}

fn otp_from_model(model: otp_challenges::Model) -> Result<OtpChallenge, AuthServiceError> {
    let context = OtpContext::from_str(&model.context)
        .ok_or_else(|| anyhow::anyhow!("unknown otp context {:?} in store", model.context))?;
    Ok(OtpChallenge {
        id: model.id,
        user_id: model.user_id,
        code_digest: model.code_digest,
        context,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    })
}

// ── Link token repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLinkTokenRepository {
    pub db: DatabaseConnection,
}

impl LinkTokenRepository for DbLinkTokenRepository {
    async fn create(&self, token: &LinkToken) -> Result<(), AuthServiceError> {
        link_tokens::ActiveModel {
            id: Set(token.id),
            user_id: Set(token.user_id),
            token_digest: Set(token.token_digest.clone()),
            token_index: Set(token.token_index.clone()),
            expires_at: Set(token.expires_at),
            used_at: Set(None),
            created_at: Set(token.created_at),
        }
        .insert(&self.db)
        .await
        .context("create link token")?;
        Ok(())
    }

    async fn find_by_index(&self, token_index: &str) -> Result<Vec<LinkToken>, AuthServiceError> {
        let now = Utc::now();
        let models = link_tokens::Entity::find()
            .filter(link_tokens::Column::TokenIndex.eq(token_index))
            .filter(link_tokens::Column::UsedAt.is_null())
            .filter(link_tokens::Column::ExpiresAt.gt(now))
            .all(&self.db)
            .await
            .context("find link tokens by index")?;
        Ok(models.into_iter().map(link_token_from_model).collect())
    }

    async fn find_active(&self) -> Result<Vec<LinkToken>, AuthServiceError> {
        let now = Utc::now();
        let models = link_tokens::Entity::find()
            .filter(link_tokens::Column::UsedAt.is_null())
            .filter(link_tokens::Column::ExpiresAt.gt(now))
            .all(&self.db)
            .await
            .context("find active link tokens")?;
        Ok(models.into_iter().map(link_token_from_model).collect())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let result = link_tokens::Entity::update_many()
            .col_expr(link_tokens::Column::UsedAt, Expr::value(Some(Utc::now())))
            .filter(link_tokens::Column::Id.eq(id))
            .filter(link_tokens::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume link token")?;
        Ok(result.rows_affected == 1)
    }
}

fn link_token_from_model(model: link_tokens::Model) -> LinkToken {
    LinkToken {
        id: model.id,
        user_id: model.user_id,
        token_digest: model.token_digest,
        token_index: model.token_index,
        expires_at: model.expires_at,
        used_at: model.used_at,
        created_at: model.created_at,
    }
}

// ── Recovery code repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRecoveryCodeRepository {
    pub db: DatabaseConnection,
}

impl RecoveryCodeRepository for DbRecoveryCodeRepository {
    async fn add_batch(&self, codes: &[RecoveryCode]) -> Result<(), AuthServiceError> {
        let rows: Vec<recovery_codes::ActiveModel> = codes
            .iter()
            .map(|code| recovery_codes::ActiveModel {
                id: Set(code.id),
                user_id: Set(code.user_id),
                code_digest: Set(code.code_digest.clone()),
                code_index: Set(code.code_index.clone()),
                used_at: Set(None),
                created_at: Set(code.created_at),
            })
            .collect();
        recovery_codes::Entity::insert_many(rows)
            .exec(&self.db)
            .await
            .context("add recovery code batch")?;
        Ok(())
    }

    async fn count_for_user(&self, user_id: i64) -> Result<u64, AuthServiceError> {
        let count = recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("count recovery codes")?;
        Ok(count)
    }

    async fn find_by_index(
        &self,
        user_id: i64,
        code_index: &str,
    ) -> Result<Vec<RecoveryCode>, AuthServiceError> {
        let models = recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::CodeIndex.eq(code_index))
            .filter(recovery_codes::Column::UsedAt.is_null())
            .all(&self.db)
            .await
            .context("find recovery codes by index")?;
        Ok(models.into_iter().map(recovery_code_from_model).collect())
    }

    async fn find_unused(&self, user_id: i64) -> Result<Vec<RecoveryCode>, AuthServiceError> {
        let models = recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::UsedAt.is_null())
            .all(&self.db)
            .await
            .context("find unused recovery codes")?;
        Ok(models.into_iter().map(recovery_code_from_model).collect())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, AuthServiceError> {
        let result = recovery_codes::Entity::update_many()
            .col_expr(
                recovery_codes::Column::UsedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(recovery_codes::Column::Id.eq(id))
            .filter(recovery_codes::Column::UsedAt.is_null())
            .exec(&self.db)
            .await
            .context("consume recovery code")?;
        Ok(result.rows_affected == 1)
    }
}

fn recovery_code_from_model(model: recovery_codes::Model) -> RecoveryCode {
    RecoveryCode {
        id: model.id,
        user_id: model.user_id,
        code_digest: model.code_digest,
        code_index: model.code_index,
        used_at: model.used_at,
        created_at: model.created_at,
    }
}
