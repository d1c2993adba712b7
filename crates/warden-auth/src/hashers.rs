//! Password hashing for warden.
//!
//! The reset, change-password, and create-user flows store passwords through
//! a [`PasswordHasher`]. Hashing is async, delegating CPU-bound work to
//! `tokio::task::spawn_blocking` to avoid blocking the async runtime.
//!
//! # Hashers
//!
//! - [`Argon2Hasher`] - Argon2id (recommended)
//! - [`PlaintextHasher`] - Stores the password as-is. For test suites only.

use async_trait::async_trait;
use warden_core::error::WardenError;
use warden_core::utils::crypto::{constant_time_eq, random_urlsafe};

/// Marker string for unusable passwords (accounts with no usable password).
const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Prefix of hashes produced by [`PlaintextHasher`].
const PLAINTEXT_PREFIX: &str = "plaintext$";

/// Trait for password hashing backends.
///
/// Implementations must be `Send + Sync` for safe concurrent access.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Returns the algorithm identifier (e.g., "argon2", "plaintext").
    fn algorithm(&self) -> &str;

    /// Hashes a password and returns the encoded hash string.
    async fn hash(&self, password: &str) -> Result<String, WardenError>;

    /// Verifies a password against an encoded hash.
    ///
    /// Returns `false` for unusable hashes.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, WardenError>;
}

/// Argon2id password hasher.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    fn algorithm(&self) -> &'static str {
        "argon2"
    }

    async fn hash(&self, password: &str) -> Result<String, WardenError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
            use argon2::Argon2;

            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| WardenError::InternalServerError(format!("Argon2 hash error: {e}")))?;
            Ok(hash.to_string())
        })
        .await
        .map_err(|e| WardenError::InternalServerError(format!("Task join error: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, WardenError> {
        if !is_password_usable(hash) {
            return Ok(false);
        }
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{PasswordHash, PasswordVerifier};
            use argon2::Argon2;

            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| WardenError::InternalServerError(format!("Invalid hash: {e}")))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| WardenError::InternalServerError(format!("Task join error: {e}")))?
    }
}

/// Stores passwords unhashed, prefixed with `plaintext$`.
///
/// Keeps test suites fast. Never use it outside tests.
#[derive(Debug, Clone, Default)]
pub struct PlaintextHasher;

#[async_trait]
impl PasswordHasher for PlaintextHasher {
    fn algorithm(&self) -> &'static str {
        "plaintext"
    }

    async fn hash(&self, password: &str) -> Result<String, WardenError> {
        Ok(format!("{PLAINTEXT_PREFIX}{password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, WardenError> {
        Ok(hash
            .strip_prefix(PLAINTEXT_PREFIX)
            .is_some_and(|stored| constant_time_eq(stored.as_bytes(), password.as_bytes())))
    }
}

/// Returns `true` if the encoded hash represents a usable password.
///
/// Hashes prefixed with `!` (or empty) are unusable.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Returns a random unusable password hash.
pub fn make_unusable_password() -> String {
    format!("{UNUSABLE_PASSWORD_PREFIX}{}", random_urlsafe(32))
}

/// Returns a random password for accounts created on someone's behalf.
///
/// The owner is expected to replace it through a reset token.
pub fn generate_default_password() -> String {
    random_urlsafe(24)
}
