//! # Driving Ports (Inbound API)
//!
//! The operations other components call to get a peer verified.

use crate::domain::{Peer, VerificationError};
use crate::ports::PeerRegistry;
use async_trait::async_trait;
use shared_types::SessionKind;
use std::sync::Arc;

/// Primary API of the verification subsystem.
#[async_trait]
pub trait PeerVerificationApi: Send + Sync {
    /// Start a handshake with `peer` now.
    ///
    /// Encrypts the peer's token under its public key, arms the timeout,
    /// marks the peer `PENDING` and sends the challenge to that peer only.
    ///
    /// # Errors
    ///
    /// `PeerNotFound` if the peer left the registry, `Crypto` if encryption
    /// fails, `Action` if the challenge cannot be sent.
    async fn init_peer_verification(&self, peer: &Peer) -> Result<(), VerificationError>;

    /// Ask for `peer` to be verified at the next registry commit.
    ///
    /// Overwrites any peer still waiting. Ignored in direct sessions, which
    /// call `init_peer_verification` directly.
    fn verify_peer(&self, peer: &Peer);

    /// Session this instance verifies for.
    fn session(&self) -> SessionKind;

    /// Registry holding the peers this instance verifies.
    fn registry(&self) -> Arc<dyn PeerRegistry>;
}
