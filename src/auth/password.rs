use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;
use std::sync::LazyLock;

use super::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::invalid_input("Password too short"));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::invalid_input("Password too long"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(format!("password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

/// A stored hash that cannot be parsed is reported as `Internal`; a mismatch
/// is simply `false`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AuthError::Internal(format!("invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Stand-in hash for logins that have no stored hash to check.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unused-dummy-password").ok());

/// Runs one argon2 verification against a throwaway hash so a login miss
/// costs the same as a wrong password. Always `false`.
pub fn verify_dummy(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{DUMMY_HASH, hash_password, verify_dummy, verify_password};
    use crate::auth::AuthError;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).expect("verify"));
        assert!(!verify_password("wrong horse", &hash).expect("verify"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("correct horse").expect("hash");
        let second = hash_password("correct horse").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn length_bounds_are_enforced() {
        assert!(matches!(
            hash_password("short"),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            hash_password(&"x".repeat(129)),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(hash_password(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn garbage_hash_is_internal() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash should be computed");
        assert!(hash.starts_with("$argon2"));
        assert!(!verify_dummy("unused-dummy-password"));
        assert!(!verify_dummy("anything else"));
    }
}
