use crate::crypto::SecretHasher;
use crate::domain::repository::{BindingRepository, UserRepository};
use crate::domain::types::User;
use crate::error::AuthServiceError;

pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Create an account and its cleared Telegram-binding placeholder row.
pub struct RegisterUseCase<U, B>
where
    U: UserRepository,
    B: BindingRepository,
{
    pub users: U,
    pub bindings: B,
    pub hasher: SecretHasher,
}

impl<U, B> RegisterUseCase<U, B>
where
    U: UserRepository,
    B: BindingRepository,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<User, AuthServiceError> {
        let digest = self.hasher.digest(&input.password)?;
        let user = self
            .users
            .create(&input.email, &input.username, &digest)
            .await?;
        self.bindings.create_empty(user.id).await?;
        Ok(user)
    }
}
