//! Domain Errors for Peer Verification

use shared_bus::ActionError;
use shared_crypto::CryptoError;
use shared_types::PeerId;
use thiserror::Error;

/// Errors raised by the verification handshake and the roster.
///
/// None of these close the peer connection. Handlers return them to the
/// action bus, which logs them at the dispatch boundary.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Responder could not decrypt a challenge. The exchange is abandoned.
    #[error("failed to decrypt verification token from peerId {peer_id}: {source}")]
    DecryptionFailed {
        /// Peer that sent the challenge.
        peer_id: PeerId,
        /// Underlying crypto failure.
        #[source]
        source: CryptoError,
    },

    /// Echoed token differs from the one this side generated.
    #[error(
        "Verification token for peerId {peer_id} does not match. [expected: {expected}] [received: {received}]"
    )]
    TokenMismatch {
        /// Peer that echoed the token.
        peer_id: PeerId,
        /// Token this side generated.
        expected: String,
        /// Token the peer sent back.
        received: String,
    },

    /// No echo arrived before the timer fired.
    #[error("Verification for peerId {peer_id} timed out")]
    VerificationTimeout {
        /// Peer that did not answer.
        peer_id: PeerId,
    },

    /// A message referenced a peer the registry does not know.
    #[error("peerId not found: {0}")]
    PeerNotFound(PeerId),

    /// A roster announcement could not be used.
    #[error("invalid metadata from peerId {peer_id}: {reason}")]
    InvalidMetadata {
        /// Announcing peer.
        peer_id: PeerId,
        /// What was wrong with it.
        reason: String,
    },

    /// Encryption failed on the initiator side.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Registering or sending on the action bus failed.
    #[error(transparent)]
    Action(#[from] ActionError),
}
