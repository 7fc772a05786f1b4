//! Credential hashing
//!
//! One-way adaptive password hashing with a per-call random salt embedded in
//! the output, so identical passwords hash differently each call.

use gradevault_common::error::{Error, Result};

/// Hash a password into a storable credential
pub fn hash(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))
}

/// Verify a password against a stored credential.
///
/// Returns `false` (never an error) on blank input or an undecodable
/// credential.
pub fn verify(password: &str, credential: &str) -> bool {
    if password.is_empty() || credential.is_empty() {
        return false;
    }
    bcrypt::verify(password, credential).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_matches_own_hash() {
        let credential = hash("pw").unwrap();
        assert!(verify("pw", &credential));
        assert!(!verify("other", &credential));
    }

    #[test]
    fn test_identical_passwords_hash_differently() {
        let a = hash("pw").unwrap();
        let b = hash("pw").unwrap();
        assert_ne!(a, b);
        assert!(verify("pw", &a));
        assert!(verify("pw", &b));
    }

    #[test]
    fn test_blank_input_is_false_not_error() {
        let credential = hash("pw").unwrap();
        assert!(!verify("", &credential));
        assert!(!verify("pw", ""));
        assert!(!verify("", ""));
    }

    #[test]
    fn test_garbage_credential_is_false_not_error() {
        assert!(!verify("pw", "not-a-bcrypt-hash"));
    }
}
