//! Verification tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Locally generated challenge secret.
///
/// The owner only ever transmits it encrypted; the responder echoes it back
/// in plaintext once decrypted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Generate a fresh random token (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against an echoed value.
    #[must_use]
    pub fn matches(&self, received: &str) -> bool {
        self.0 == received
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are secrets; Debug never prints them.
impl fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = VerificationToken::generate();
        let b = VerificationToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_matches_exact_value_only() {
        let token = VerificationToken::new("abc123");
        assert!(token.matches("abc123"));
        assert!(!token.matches("abc1234"));
        assert!(!token.matches("ABC123"));
        assert!(!token.matches(""));
    }

    #[test]
    fn test_debug_is_redacted() {
        let token = VerificationToken::new("abc123");
        assert!(!format!("{token:?}").contains("abc123"));
        assert_eq!(token.to_string(), "abc123");
    }
}
