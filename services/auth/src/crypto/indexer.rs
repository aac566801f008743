use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::AuthServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Keyed deterministic digest of a plaintext secret, used purely as an
/// equality lookup key.
///
/// The same plaintext always yields the same key, which collapses an O(n)
/// scan over outstanding secrets into an O(1) candidate fetch. It is never
/// proof of possession on its own — every hit must still pass
/// `SecretHasher::verify` against the salted digest.
#[derive(Clone)]
pub struct DeterministicIndexer {
    key: Vec<u8>,
}

impl DeterministicIndexer {
    /// Build an indexer from the configured keying secret. An absent or
    /// empty secret is a hard startup error, not a silent degradation: an
    /// unkeyed index would be a plain hash anyone could precompute.
    pub fn new(key: &str) -> Result<Self, AuthServiceError> {
        if key.is_empty() {
            return Err(AuthServiceError::NotConfigured("index keying secret"));
        }
        Ok(Self {
            key: key.as_bytes().to_vec(),
        })
    }

    /// HMAC-SHA256 of the plaintext, hex-encoded.
    pub fn index(&self, plaintext: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("hmac accepts keys of any length");
        mac.update(plaintext.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
