//! Verification configuration.

use std::time::Duration;

/// Default time an initiator waits for the echoed token.
pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 10_000;

/// Tunables for the verification handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationConfig {
    /// How long a peer may stay `PENDING` before it is reset to `UNVERIFIED`.
    pub timeout: Duration,
}

impl VerificationConfig {
    /// Config with an explicit timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Short timeouts for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout: Duration::from_millis(500),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_VERIFICATION_TIMEOUT_MS),
        }
    }
}
