//! Password hashing and credential checks.
//!
//! Stored hashes are argon2id PHC strings (`$argon2id$v=19$...`) carrying
//! their own salt and parameters.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

use crate::entity::User;
use crate::error::{NotekeeperError, Result};
use crate::storage::UserRepository;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Look up `username` and check the password.
///
/// Unknown users and wrong passwords produce the same error.
pub fn authenticate<R>(repo: &R, username: &str, password: &str) -> Result<User>
where
    R: UserRepository + ?Sized,
{
    match repo.find_by_username(username)? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(user),
        _ => Err(NotekeeperError::InvalidCredentials),
    }
}
