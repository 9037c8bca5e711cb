//! # Scheduling Buffer
//!
//! A single pending slot decoupling "a peer became known" from "start
//! verifying it". Scheduling overwrites whatever is waiting (last-wins, not a
//! queue); the service drains the slot after registry commits.

use super::entities::Peer;
use shared_types::PeerId;

/// Zero-or-one peer waiting to be verified.
#[derive(Debug, Default)]
pub struct SchedulingBuffer {
    pending: Option<Peer>,
    superseded: u64,
}

impl SchedulingBuffer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `peer` in the slot.
    ///
    /// # Returns
    ///
    /// The peer it replaced, if the slot was not drained yet.
    pub fn schedule(&mut self, peer: Peer) -> Option<Peer> {
        let previous = self.pending.replace(peer);
        if previous.is_some() {
            self.superseded += 1;
        }
        previous
    }

    /// Empty the slot.
    pub fn take(&mut self) -> Option<Peer> {
        self.pending.take()
    }

    /// Id of the waiting peer.
    #[must_use]
    pub fn pending_peer_id(&self) -> Option<&PeerId> {
        self.pending.as_ref().map(|peer| &peer.peer_id)
    }

    /// True if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// How many scheduled peers were overwritten before being drained.
    #[must_use]
    pub fn superseded_count(&self) -> u64 {
        self.superseded
    }
}
