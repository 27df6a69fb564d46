use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

/// Hash a password using Argon2 with secure defaults
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::unknown(Some(format!("password hashing failed: {}", e))))
}

/// Verify a password against a hash using constant-time comparison
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::unknown(Some(format!("stored password hash is invalid: {}", e))))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Why a password is too weak, if it is.
pub fn password_strength_issue(password: &str) -> Option<&'static str> {
    if password.len() < 8 {
        return Some("Password must be at least 8 characters long");
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_number = password.chars().any(|c| c.is_numeric());

    if !has_letter || !has_number {
        return Some("Password must contain at least one letter and one number");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "test_password123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(password_strength_issue("test1234").is_none());
        assert!(password_strength_issue("TestPass123").is_none());

        // Too short
        assert!(password_strength_issue("test1").is_some());

        // No number
        assert!(password_strength_issue("testpassword").is_some());

        // No letter
        assert!(password_strength_issue("12345678").is_some());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        assert!(verify_password("anything1", "not-a-phc-string").is_err());
    }
}
