use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use rand::rngs::OsRng;

use super::errors::AuthError;

/// Salted argon2 hash in PHC string form.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
}

pub fn check_length(plain: &str, min: usize) -> Result<(), AuthError> {
    if plain.chars().count() < min {
        return Err(AuthError::Validation(format!("password too short (>={min})")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let h = hash_password("segredo1").unwrap();
        assert!(h.starts_with("$argon2"));
        assert!(verify_password("segredo1", &h).unwrap());
        assert!(!verify_password("outro", &h).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(matches!(verify_password("x", "not-a-hash"), Err(AuthError::HashError(_))));
    }

    #[test]
    fn length_rule() {
        assert!(check_length("12345", 6).is_err());
        assert!(check_length("123456", 6).is_ok());
    }
}
