//! In-memory `PeerRegistry`.

use crate::domain::{Peer, PeerUpdate};
use crate::ports::{CommitListener, PeerRegistry, UpdateOutcome};
use parking_lot::{Mutex, RwLock};
use shared_types::PeerId;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Ordered peer list behind a single mutex.
///
/// Listeners run after the lock is released, so they may read the registry.
#[derive(Default)]
pub struct InMemoryPeerRegistry {
    peers: Mutex<Vec<Peer>>,
    listeners: RwLock<Vec<CommitListener>>,
    commits: AtomicU64,
}

impl InMemoryPeerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of peers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.lock().len()
    }

    /// True if no peers are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.lock().is_empty()
    }

    /// Number of commits so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Acquire)
    }

    fn commit(&self) {
        self.commits.fetch_add(1, Ordering::AcqRel);
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener();
        }
    }
}

impl PeerRegistry for InMemoryPeerRegistry {
    fn peer(&self, peer_id: &PeerId) -> Option<Peer> {
        self.peers
            .lock()
            .iter()
            .find(|peer| &peer.peer_id == peer_id)
            .cloned()
    }

    fn peer_list(&self) -> Vec<Peer> {
        self.peers.lock().clone()
    }

    fn insert_peer(&self, peer: Peer) -> Option<Peer> {
        let peer_id = peer.peer_id.clone();
        let replaced = {
            let mut peers = self.peers.lock();
            match peers.iter_mut().find(|p| p.peer_id == peer.peer_id) {
                Some(slot) => Some(std::mem::replace(slot, peer)),
                None => {
                    peers.push(peer);
                    None
                }
            }
        };

        if let Some(timer) = replaced.as_ref().and_then(|p| p.verification_timer.as_ref()) {
            timer.cancel();
        }
        debug!(peer_id = %peer_id, replaced = replaced.is_some(), "Peer stored");

        self.commit();
        replaced
    }

    fn remove_peer(&self, peer_id: &PeerId) -> Option<Peer> {
        let removed = {
            let mut peers = self.peers.lock();
            peers
                .iter()
                .position(|peer| &peer.peer_id == peer_id)
                .map(|index| peers.remove(index))
        }?;

        if let Some(timer) = &removed.verification_timer {
            timer.cancel();
        }
        debug!(peer_id = %peer_id, "Peer removed");

        self.commit();
        Some(removed)
    }

    fn update_peer_if(
        &self,
        peer_id: &PeerId,
        guard: &dyn Fn(&Peer) -> bool,
        update: PeerUpdate,
    ) -> UpdateOutcome {
        {
            let mut peers = self.peers.lock();
            let Some(peer) = peers.iter_mut().find(|peer| &peer.peer_id == peer_id) else {
                return UpdateOutcome::NotFound;
            };
            if !guard(peer) {
                return UpdateOutcome::Rejected;
            }
            peer.apply(update);
        }

        self.commit();
        UpdateOutcome::Applied
    }

    fn subscribe_commits(&self, listener: CommitListener) {
        self.listeners.write().push(listener);
    }
}
