//! # Public-Key Encryption (secp256k1 ECIES)
//!
//! Encrypts to a peer's compressed secp256k1 public key.
//!
//! ## Envelope
//!
//! ```text
//! ┌──────────────────────┬──────────────┬──────────────────────────────┐
//! │ ephemeral pubkey (33)│  nonce (24)  │ XChaCha20-Poly1305 ct + tag  │
//! └──────────────────────┴──────────────┴──────────────────────────────┘
//! ```
//!
//! Key derivation: `SHA-256(DOMAIN || ecdh_x || ephemeral_pub || recipient_pub)`.

use crate::symmetric::{self, Nonce, SecretKey, NONCE_LEN, TAG_LEN};
use crate::CryptoError;
use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Compressed SEC1 public key length.
pub const PUBLIC_KEY_LEN: usize = 33;

/// Smallest valid envelope (empty plaintext).
pub const MIN_CIPHERTEXT_LEN: usize = PUBLIC_KEY_LEN + NONCE_LEN + TAG_LEN;

const KDF_DOMAIN: &[u8] = b"peer-mesh/ecies/v1";

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncryptionPublicKey([u8; PUBLIC_KEY_LEN]);

impl EncryptionPublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Result<Self, CryptoError> {
        PublicKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        let bytes: [u8; PUBLIC_KEY_LEN] =
            raw.as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LEN,
                    actual: raw.len(),
                })?;
        Self::from_bytes(bytes)
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn to_point(self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }

    fn from_point(point: &PublicKey) -> Result<Self, CryptoError> {
        let encoded = point.to_encoded_point(true);
        let bytes: [u8; PUBLIC_KEY_LEN] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionPublicKey({})", &self.to_hex()[..16])
    }
}

/// secp256k1 private key. Zeroized on drop by `k256`.
#[derive(Clone)]
pub struct EncryptionSecretKey(k256::SecretKey);

impl EncryptionSecretKey {
    /// Create from 32 raw scalar bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        k256::SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Matching public key.
    pub fn public_key(&self) -> Result<EncryptionPublicKey, CryptoError> {
        EncryptionPublicKey::from_point(&self.0.public_key())
    }
}

impl fmt::Debug for EncryptionSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionSecretKey(..)")
    }
}

/// A local encryption identity.
#[derive(Clone, Debug)]
pub struct EncryptionKeyPair {
    secret: EncryptionSecretKey,
    public: EncryptionPublicKey,
}

impl EncryptionKeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Result<Self, CryptoError> {
        let secret = EncryptionSecretKey(k256::SecretKey::random(&mut OsRng));
        let public = secret.public_key()?;
        Ok(Self { secret, public })
    }

    /// Build from an existing private key.
    pub fn from_secret(secret: EncryptionSecretKey) -> Result<Self, CryptoError> {
        let public = secret.public_key()?;
        Ok(Self { secret, public })
    }

    /// Private half.
    pub fn secret(&self) -> &EncryptionSecretKey {
        &self.secret
    }

    /// Public half.
    pub fn public_key(&self) -> EncryptionPublicKey {
        self.public
    }
}

fn derive_key(
    shared_x: &[u8],
    ephemeral: &EncryptionPublicKey,
    recipient: &EncryptionPublicKey,
) -> SecretKey {
    let mut hasher = Sha256::new();
    hasher.update(KDF_DOMAIN);
    hasher.update(shared_x);
    hasher.update(ephemeral.as_bytes());
    hasher.update(recipient.as_bytes());
    SecretKey::from_bytes(hasher.finalize().into())
}

/// Encrypt `plaintext` so only the holder of `recipient`'s private key can
/// read it.
///
/// # Errors
///
/// `InvalidPublicKey` if `recipient` is not on the curve,
/// `EncryptionFailed` if the AEAD fails.
pub fn seal(recipient: &EncryptionPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let recipient_point = recipient.to_point()?;

    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_pub = EncryptionPublicKey::from_point(&ephemeral.public_key())?;
    let shared = ephemeral.diffie_hellman(&recipient_point);

    let key = derive_key(shared.raw_secret_bytes().as_slice(), &ephemeral_pub, recipient);
    let (ciphertext, nonce) = symmetric::encrypt(&key, plaintext)?;

    let mut envelope = Vec::with_capacity(MIN_CIPHERTEXT_LEN + plaintext.len());
    envelope.extend_from_slice(ephemeral_pub.as_bytes());
    envelope.extend_from_slice(nonce.as_bytes());
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Decrypt an envelope produced by [`seal`].
///
/// # Errors
///
/// `CiphertextTooShort`, `InvalidPublicKey` (corrupted ephemeral key) or
/// `DecryptionFailed` (wrong key, tampering).
pub fn open(secret: &EncryptionSecretKey, envelope: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if envelope.len() < MIN_CIPHERTEXT_LEN {
        return Err(CryptoError::CiphertextTooShort {
            min: MIN_CIPHERTEXT_LEN,
            actual: envelope.len(),
        });
    }

    let (ephemeral_bytes, rest) = envelope.split_at(PUBLIC_KEY_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let ephemeral_point =
        PublicKey::from_sec1_bytes(ephemeral_bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
    let ephemeral_pub = EncryptionPublicKey::from_point(&ephemeral_point)?;
    let recipient = secret.public_key()?;

    let shared = diffie_hellman(secret.0.to_nonzero_scalar(), ephemeral_point.as_affine());
    let key = derive_key(shared.raw_secret_bytes().as_slice(), &ephemeral_pub, &recipient);

    symmetric::decrypt(&key, ciphertext, &Nonce::from_slice(nonce_bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let pair = EncryptionKeyPair::generate().unwrap();
        let envelope = seal(&pair.public_key(), b"abc123").unwrap();
        assert_eq!(open(pair.secret(), &envelope).unwrap(), b"abc123");
        assert_eq!(envelope.len(), MIN_CIPHERTEXT_LEN + 6);
    }

    #[test]
    fn test_wrong_recipient_cannot_open() {
        let alice = EncryptionKeyPair::generate().unwrap();
        let mallory = EncryptionKeyPair::generate().unwrap();

        let envelope = seal(&alice.public_key(), b"for alice").unwrap();
        assert!(matches!(
            open(mallory.secret(), &envelope),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_ciphertexts_are_randomized() {
        let pair = EncryptionKeyPair::generate().unwrap();
        let a = seal(&pair.public_key(), b"same").unwrap();
        let b = seal(&pair.public_key(), b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let pair = EncryptionKeyPair::generate().unwrap();
        assert!(matches!(
            open(pair.secret(), &[0u8; 10]),
            Err(CryptoError::CiphertextTooShort { actual: 10, .. })
        ));
    }

    #[test]
    fn test_public_key_hex() {
        let pair = EncryptionKeyPair::generate().unwrap();
        let hex = pair.public_key().to_hex();
        assert_eq!(hex.len(), PUBLIC_KEY_LEN * 2);
        assert_eq!(EncryptionPublicKey::from_hex(&hex).unwrap(), pair.public_key());
        assert!(EncryptionPublicKey::from_hex("02abcd").is_err());
        assert!(EncryptionPublicKey::from_hex("not hex").is_err());
    }

    #[test]
    fn test_invalid_point_rejected() {
        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes[0] = 0x05;
        assert_eq!(
            EncryptionPublicKey::from_bytes(bytes),
            Err(CryptoError::InvalidPublicKey)
        );
    }

    #[test]
    fn test_secret_from_bytes_rejects_zero() {
        assert!(EncryptionSecretKey::from_bytes(&[0u8; 32]).is_err());
        let key = EncryptionSecretKey::from_bytes(&[7u8; 32]).unwrap();
        let pair = EncryptionKeyPair::from_secret(key).unwrap();
        let envelope = seal(&pair.public_key(), b"x").unwrap();
        assert_eq!(open(pair.secret(), &envelope).unwrap(), b"x");
    }
}
