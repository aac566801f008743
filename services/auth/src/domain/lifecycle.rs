use crate::error::AuthServiceError;

/// Why a single-use secret failed verify-and-consume.
///
/// Every secret-bearing record moves through the same lifecycle:
/// issued → verified-and-consumed | expired | already-used. The variants
/// exist for internal decisions and tests; converting to
/// `AuthServiceError` erases the distinction so the wire never reveals
/// which gate rejected the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeError {
    /// No record matched the identifier or lookup index.
    NotFound,
    /// The record was consumed earlier, or another consumer won the
    /// conditional update race.
    AlreadyUsed,
    /// Past `expires_at`. Checked before the digest so an expired-but-
    /// correct code is indistinguishable from a wrong one.
    Expired,
    /// The salted digest did not match the presented secret.
    SecretMismatch,
}

impl From<ConsumeError> for AuthServiceError {
    fn from(_: ConsumeError) -> Self {
        AuthServiceError::InvalidOrExpired
    }
}
