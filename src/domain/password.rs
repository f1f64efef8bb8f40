use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

/// Hashes a password with argon2id and a fresh random salt.
///
/// # Errors
/// `Internal` if hashing fails.
pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)
        .map(|h| h.to_string())
}

/// Verifies a password against a stored hash. Comparison is delegated to the
/// hashing library, never a direct equality check on hash bytes.
///
/// # Errors
/// `Internal` if the stored hash cannot be parsed.
pub fn verify(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AppError::Internal)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
}
