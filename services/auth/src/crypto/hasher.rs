use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::AuthServiceError;

/// Salted one-way hashing of secrets (passwords, OTPs, link tokens,
/// recovery codes).
///
/// Digests are PHC strings carrying their own salt, so hashing the same
/// plaintext twice yields different digests and no stored value can be
/// matched by equality. Equality lookup is the indexer's job, not this one.
#[derive(Clone, Default)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Hasher with explicit cost parameters. `Default` uses the argon2id
    /// recommended costs, which keep interactive verification well under
    /// 200ms; tests dial the parameters down.
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a plaintext secret with a fresh random salt.
    pub fn digest(&self, plaintext: &str) -> Result<String, AuthServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))?;
        Ok(digest.to_string())
    }

    /// Verify a plaintext against a stored digest using the embedded salt.
    ///
    /// Malformed digests report as a mismatch rather than an error, so
    /// callers cannot distinguish a corrupt record from a wrong secret.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
