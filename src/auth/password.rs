//! Password hashing and verification using Argon2
//!
//! argon2id with default parameters; hashes are stored as PHC strings.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::HabitusError;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, HabitusError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HabitusError::Auth(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HabitusError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| HabitusError::Auth(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
