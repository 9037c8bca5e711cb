//! Deferred verification through the single-slot buffer.

use super::core::PeerVerificationService;
use crate::domain::Peer;
use shared_types::PeerId;
use tracing::{debug, error};

impl PeerVerificationService {
    /// Ask for `peer` to be verified once the registry settles.
    ///
    /// Last-wins: a peer still waiting in the slot is replaced. No-op in
    /// direct sessions.
    pub fn verify_peer(&self, peer: &Peer) {
        if self.session.is_direct() {
            debug!(peer_id = %peer.peer_id, "Direct session, scheduled verification skipped");
            return;
        }

        if let Some(previous) = self.scheduled.lock().schedule(peer.clone()) {
            debug!(
                peer_id = %previous.peer_id,
                superseded_by = %peer.peer_id,
                "Scheduled verification superseded"
            );
        }
        self.drain_signal.notify_one();
    }

    /// Peer waiting in the slot, if any.
    #[must_use]
    pub fn scheduled_peer_id(&self) -> Option<PeerId> {
        self.scheduled.lock().pending_peer_id().cloned()
    }

    /// Hand the waiting peer to the handshake, reading its current registry
    /// entry rather than the scheduled snapshot.
    pub(crate) async fn drain_scheduled(&self) {
        if self.session.is_direct() {
            return;
        }
        let Some(scheduled) = self.scheduled.lock().take() else {
            return;
        };
        let Some(peer) = self.ports.registry.peer(&scheduled.peer_id) else {
            debug!(peer_id = %scheduled.peer_id, "Scheduled peer left before verification");
            return;
        };

        if let Err(e) = self.init_peer_verification(&peer).await {
            error!(peer_id = %peer.peer_id, error = %e, "Failed to start peer verification");
        }
    }
}
