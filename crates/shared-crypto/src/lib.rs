//! # Shared Crypto - Encryption Capability
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `symmetric` | XChaCha20-Poly1305 | Payload encryption under a derived key |
//! | `ecies` | secp256k1 ECDH + SHA-256 KDF | Encrypt to a peer's public key |
//! | `capability` | - | Async `EncryptionService` consumed by peer verification |
//!
//! ## Security Properties
//!
//! - **Fresh ephemeral key per message**: two encryptions of the same token
//!   never produce the same ciphertext.
//! - **Authenticated**: any bit flip, truncation or wrong private key fails
//!   with `CryptoError::DecryptionFailed`.
//! - **XChaCha20**: 192-bit random nonce, constant-time.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod ecies;
pub mod errors;
pub mod symmetric;

// Re-exports
pub use capability::{EciesEncryption, EncryptionService};
pub use ecies::{EncryptionKeyPair, EncryptionPublicKey, EncryptionSecretKey};
pub use errors::CryptoError;
pub use symmetric::{decrypt, encrypt, Nonce, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
