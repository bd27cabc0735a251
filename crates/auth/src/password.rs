//! Credential hashing (Argon2, PHC string format).

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

use argon2::Argon2;
use thiserror::Error;

#[cfg(test)]
thread_local! {
    /// Argon2 verifications run on this thread.
    pub(crate) static ARGON2_VERIFICATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Hash of a throwaway secret, verified against when no stored hash exists.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("shopfront-no-such-credential").ok());

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("salt generation failed: {0}")]
    Salt(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext credential into a salted PHC string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordError::Salt(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Salt(e.to_string()))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Check a candidate against a stored PHC hash.
///
/// The comparison is constant-time. A stored value that is not a PHC string
/// never verifies.
pub fn verify_password(stored_hash: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => {
            #[cfg(test)]
            ARGON2_VERIFICATIONS.with(|n| n.set(n.get() + 1));
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        }
        Err(_) => false,
    }
}

/// `verify_password` against `stored`, or against a fixed dummy hash when
/// there is none so both cases cost one Argon2 verification.
///
/// `None` never verifies.
pub fn verify_password_or_dummy(stored: Option<&str>, candidate: &str) -> bool {
    match stored {
        Some(hash) => verify_password(hash, candidate),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(dummy, candidate);
            }
            false
        }
    }
}
