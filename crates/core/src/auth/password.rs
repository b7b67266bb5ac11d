//! Argon2id password hashes in PHC string form.
//!
//! Every hash carries its own random salt and parameters, so stored hashes
//! stay verifiable if the defaults change later.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Password hashing and policy errors.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Argon2 could not produce a hash.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Argon2 failed for a reason other than a mismatch.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Stored value is not a PHC string.
    #[error("stored password hash is malformed")]
    InvalidHash,

    /// Below [`MIN_PASSWORD_LEN`].
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
}

/// Hashes `password` with a fresh salt.
///
/// ```
/// let hash = quotely_core::auth::hash_password("s3cret!").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
///
/// # Errors
///
/// Returns `HashError` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks `password` against a stored hash. A mismatch is `Ok(false)`.
///
/// # Errors
///
/// Returns `InvalidHash` for a malformed stored hash and `VerifyError`
/// for any other Argon2 failure.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::InvalidHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Applies the length rule to a new password.
///
/// # Errors
///
/// Returns `TooShort` for fewer than [`MIN_PASSWORD_LEN`] characters.
pub fn check_password_policy(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}
