use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::core::error::{AppError, Result};

/// Hash a plaintext password with Argon2id and a random salt (PHC string)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored hash.
///
/// An unparsable hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Principals that log in with a password.
///
/// The plaintext password is write-only: reading it always fails.
pub trait Credentials {
    fn password_hash(&self) -> Option<&str>;

    /// Accounts created through an OAuth2 provider have no password and never match
    fn verify_password(&self, password: &str) -> bool {
        self.password_hash()
            .is_some_and(|hash| verify_password(password, hash))
    }

    fn password(&self) -> Result<String> {
        Err(AppError::Forbidden(
            "password is not a readable attribute".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        hash: Option<String>,
    }

    impl Credentials for Account {
        fn password_hash(&self) -> Option<&str> {
            self.hash.as_deref()
        }
    }

    #[test]
    fn test_hash_is_salted_argon2id() {
        let first = hash_password("cat-on-the-mat").unwrap();
        let second = hash_password("cat-on-the-mat").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("cat-on-the-mat"));
    }

    #[test]
    fn test_verify_round_trip() {
        let hash = hash_password("cat-on-the-mat").unwrap();
        assert!(verify_password("cat-on-the-mat", &hash));
        assert!(!verify_password("dog-on-the-mat", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_password_attribute_is_write_only() {
        let account = Account {
            hash: Some(hash_password("secret1").unwrap()),
        };
        assert!(account.verify_password("secret1"));
        assert!(matches!(account.password(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_passwordless_account_never_verifies() {
        let account = Account { hash: None };
        assert!(!account.verify_password(""));
        assert!(!account.verify_password("secret1"));
    }
}
