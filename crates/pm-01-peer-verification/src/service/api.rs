//! `PeerVerificationApi` implementation.

use super::core::PeerVerificationService;
use crate::domain::{Peer, VerificationError};
use crate::ports::{PeerRegistry, PeerVerificationApi};
use async_trait::async_trait;
use shared_types::SessionKind;
use std::sync::Arc;

#[async_trait]
impl PeerVerificationApi for PeerVerificationService {
    async fn init_peer_verification(&self, peer: &Peer) -> Result<(), VerificationError> {
        PeerVerificationService::init_peer_verification(self, peer).await
    }

    fn verify_peer(&self, peer: &Peer) {
        PeerVerificationService::verify_peer(self, peer);
    }

    fn session(&self) -> SessionKind {
        self.session
    }

    fn registry(&self) -> Arc<dyn PeerRegistry> {
        PeerVerificationService::registry(self).clone()
    }
}
