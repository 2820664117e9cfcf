//! Secret and password hashing via bcrypt.

use std::sync::OnceLock;

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Plaintext behind the timing-equalizer hash. Never a real credential.
const DUMMY_SECRET: &str = "keygate-timing-equalizer";

/// Hash a secret with bcrypt (cost 10).
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    bcrypt::hash(secret, BCRYPT_COST).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a secret against a bcrypt hash. The digest comparison is constant-time.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(secret, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// A hash with the same cost as real ones, verified against when no stored
/// hash exists so lookups that miss take as long as lookups that hit.
pub(crate) fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_secret(DUMMY_SECRET).unwrap_or_default())
}
