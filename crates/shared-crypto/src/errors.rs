//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// Every variant is a failed crypto operation from the caller's point of
/// view; peer verification treats them all alike.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, tampered or malformed ciphertext)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Ciphertext is shorter than the fixed envelope overhead
    #[error("Ciphertext too short: need at least {min} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum envelope length in bytes
        min: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Invalid input for cryptographic operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
