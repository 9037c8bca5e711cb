//! # Encryption Capability
//!
//! The asynchronous string-level interface the verification protocol
//! consumes. Passed into the protocol explicitly so tests can swap in
//! scripted implementations.

use crate::ecies::{self, EncryptionPublicKey, EncryptionSecretKey};
use crate::CryptoError;
use async_trait::async_trait;

/// Asymmetric string encryption.
#[async_trait]
pub trait EncryptionService: Send + Sync {
    /// Encrypt `plaintext` to `public_key`.
    async fn encrypt_string(
        &self,
        public_key: &EncryptionPublicKey,
        plaintext: &str,
    ) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext` with `private_key`.
    ///
    /// # Errors
    ///
    /// Fails on a wrong key, tampered or malformed ciphertext, or a
    /// plaintext that is not UTF-8.
    async fn decrypt_string(
        &self,
        private_key: &EncryptionSecretKey,
        ciphertext: &[u8],
    ) -> Result<String, CryptoError>;
}

/// Default capability backed by secp256k1 ECIES.
#[derive(Debug, Clone, Copy, Default)]
pub struct EciesEncryption;

impl EciesEncryption {
    /// Create the capability.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EncryptionService for EciesEncryption {
    async fn encrypt_string(
        &self,
        public_key: &EncryptionPublicKey,
        plaintext: &str,
    ) -> Result<Vec<u8>, CryptoError> {
        ecies::seal(public_key, plaintext.as_bytes())
    }

    async fn decrypt_string(
        &self,
        private_key: &EncryptionSecretKey,
        ciphertext: &[u8],
    ) -> Result<String, CryptoError> {
        let plaintext = ecies::open(private_key, ciphertext)?;
        String::from_utf8(plaintext).map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncryptionKeyPair;

    #[tokio::test]
    async fn test_string_roundtrip() {
        let service = EciesEncryption::new();
        let pair = EncryptionKeyPair::generate().unwrap();

        let ct = service
            .encrypt_string(&pair.public_key(), "3f1c9a7e-token")
            .await
            .unwrap();
        let pt = service.decrypt_string(pair.secret(), &ct).await.unwrap();
        assert_eq!(pt, "3f1c9a7e-token");
    }

    #[tokio::test]
    async fn test_garbage_fails() {
        let service = EciesEncryption::new();
        let pair = EncryptionKeyPair::generate().unwrap();
        assert!(service
            .decrypt_string(pair.secret(), &[1u8; 100])
            .await
            .is_err());
    }
}
