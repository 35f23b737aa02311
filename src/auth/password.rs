use bcrypt::{hash, verify, DEFAULT_COST};
use rand::Rng;
use thiserror::Error;

use crate::validation::{field_error, ValidationError};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),
    #[error("Password must be no more than {0} characters long")]
    TooLong(usize),
    #[error("Password must contain at least one letter")]
    NoLetter,
    #[error("Password must contain at least one number")]
    NoNumber,
    #[error("Failed to hash password")]
    HashingFailed,
    #[error("Failed to verify password")]
    VerificationFailed,
}

impl PasswordError {
    /// Policy violations are the caller's fault; hashing failures are ours.
    pub fn is_policy_violation(&self) -> bool {
        !matches!(self, PasswordError::HashingFailed | PasswordError::VerificationFailed)
    }
}

/// Password strength requirements
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_number: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_letter: true,
            require_number: true,
        }
    }
}

/// Validate password strength according to policy
pub fn validate_password_strength(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < policy.min_length {
        return Err(PasswordError::TooShort(policy.min_length));
    }

    if length > policy.max_length {
        return Err(PasswordError::TooLong(policy.max_length));
    }

    if policy.require_letter && !password.chars().any(char::is_alphabetic) {
        return Err(PasswordError::NoLetter);
    }

    if policy.require_number && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::NoNumber);
    }

    Ok(())
}

/// `validator` hook applying the default policy to password fields.
pub fn strong_password(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password, &PasswordPolicy::default())
        .map_err(|err| field_error("password_policy", err.to_string()))
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password_strength(password, &PasswordPolicy::default())?;

    hash(password, DEFAULT_COST).map_err(|_| PasswordError::HashingFailed)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
}

/// Generate a secure random password reset token
pub fn generate_reset_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::thread_rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Only the digest of a reset token is stored.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_password_validation() {
        let policy = PasswordPolicy::default();

        assert_matches!(
            validate_password_strength("short1", &policy),
            Err(PasswordError::TooShort(8))
        );
        assert_matches!(
            validate_password_strength("12345678", &policy),
            Err(PasswordError::NoLetter)
        );
        assert_matches!(
            validate_password_strength("bezcyferek", &policy),
            Err(PasswordError::NoNumber)
        );
        assert_matches!(
            validate_password_strength(&"a1".repeat(65), &policy),
            Err(PasswordError::TooLong(128))
        );

        assert!(validate_password_strength("trening2024", &policy).is_ok());
        // multi-byte letters count once
        assert!(validate_password_strength("żółć1234", &policy).is_ok());
    }

    #[test]
    fn test_strong_password_reports_policy_message() {
        let err = strong_password("krotkie").unwrap_err();
        assert_eq!(err.code, "password_policy");
        assert_eq!(
            err.message.as_deref(),
            Some("Password must be at least 8 characters long")
        );
        assert!(strong_password("Trening123").is_ok());
    }

    #[test]
    fn test_password_hashing() {
        let password = "TestPassword123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("WrongPassword1", &hash).unwrap());
    }

    #[test]
    fn test_policy_violation_classification() {
        assert!(PasswordError::NoNumber.is_policy_violation());
        assert!(!PasswordError::HashingFailed.is_policy_violation());
    }

    #[test]
    fn test_reset_token_generation() {
        let token1 = generate_reset_token();
        let token2 = generate_reset_token();

        assert_eq!(token1.len(), 48);
        assert_ne!(token1, token2);
        assert_eq!(hash_token(&token1), hash_token(&token1));
        assert_ne!(hash_token(&token1), token1);
    }
}
