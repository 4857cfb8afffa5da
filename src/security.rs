//! Credential primitives: password hashing, token digests, secret generation.
//!
//! Passwords get a slow, salted, non-deterministic hash. API and session
//! tokens get a fast deterministic digest instead, because the registries
//! look them up by exact value through an indexed column; a per-call salt
//! would defeat that lookup.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// bcrypt operates on at most 72 input bytes. Anything longer must be
/// rejected up front instead of silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Number of random bytes backing a generated secret.
const SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("password cannot be longer than {MAX_PASSWORD_BYTES} bytes")]
    PasswordTooLong,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Hash a password with bcrypt. Salted per call, so two hashes of the same
/// input differ.
pub fn hash_password(plaintext: &str) -> Result<String, SecurityError> {
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(SecurityError::PasswordTooLong);
    }
    Ok(bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)?)
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, SecurityError> {
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(SecurityError::PasswordTooLong);
    }
    Ok(bcrypt::verify(plaintext, hash)?)
}

/// Deterministic SHA-256 hex digest of a token. Stored instead of the
/// plaintext and used as the equality-lookup key.
#[must_use]
pub fn hash_token(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Recompute-and-compare verification for token digests.
#[must_use]
pub fn verify_token(plaintext: &str, token_hash: &str) -> bool {
    hash_token(plaintext) == token_hash
}

/// Generate a URL-safe secret with 32 bytes of entropy. Used for both
/// session tokens and board access tokens.
#[must_use]
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("correct horse battery stable", &hash).unwrap());
    }

    #[test]
    fn password_hash_is_salted() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn password_length_ceiling_enforced() {
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(
            hash_password(&long),
            Err(SecurityError::PasswordTooLong)
        ));
        assert!(matches!(
            verify_password(&long, "$2b$12$irrelevant"),
            Err(SecurityError::PasswordTooLong)
        ));

        // Exactly at the ceiling is still accepted.
        let max = "x".repeat(MAX_PASSWORD_BYTES);
        assert!(hash_password(&max).is_ok());
    }

    #[test]
    fn token_hash_is_deterministic() {
        let token = generate_secret();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert!(verify_token(&token, &hash_token(&token)));
        assert!(!verify_token("something-else", &hash_token(&token)));
    }

    #[test]
    fn token_hashes_differ_per_input() {
        assert_ne!(hash_token("a"), hash_token("b"));
    }

    #[test]
    fn secrets_are_url_safe_and_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
