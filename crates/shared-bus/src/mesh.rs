//! # In-Memory Mesh
//!
//! An in-process transport connecting any number of local peers. Each peer
//! gets an unbounded inbox, so frames from one sender arrive in send order.
//! Suitable for tests and single-process demos; real deployments plug a data
//! channel transport in behind `PeerTransport`.

use crate::action::ActionKey;
use crate::transport::{InboundFrame, PeerTransport, TransportError};
use async_trait::async_trait;
use shared_types::PeerId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, warn};

type Inboxes = Arc<RwLock<HashMap<PeerId, mpsc::UnboundedSender<InboundFrame>>>>;

/// Hub that every local peer joins.
pub struct InMemoryMesh {
    /// Inbox sender for each joined peer.
    inboxes: Inboxes,

    /// Total frames handed to inboxes.
    frames_delivered: Arc<AtomicU64>,
}

impl InMemoryMesh {
    /// Create an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inboxes: Arc::new(RwLock::new(HashMap::new())),
            frames_delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Join the mesh as `peer_id`.
    ///
    /// Returns the peer's transport and the receiver its channel should
    /// dispatch from. Joining twice under the same id replaces the previous
    /// connection, which then stops receiving frames.
    #[must_use]
    pub fn join(&self, peer_id: PeerId) -> (Arc<MeshTransport>, mpsc::UnboundedReceiver<InboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();

        if let Ok(mut inboxes) = self.inboxes.write() {
            if inboxes.insert(peer_id.clone(), tx).is_some() {
                warn!(peer_id = %peer_id, "Peer rejoined mesh, previous connection replaced");
            }
        }
        debug!(peer_id = %peer_id, "Peer joined mesh");

        let transport = MeshTransport {
            local: peer_id,
            inboxes: self.inboxes.clone(),
            frames_delivered: self.frames_delivered.clone(),
        };
        (Arc::new(transport), rx)
    }

    /// Tear down `peer_id`'s connection.
    ///
    /// Returns true if the peer was connected.
    pub fn leave(&self, peer_id: &PeerId) -> bool {
        let removed = self
            .inboxes
            .write()
            .map(|mut inboxes| inboxes.remove(peer_id).is_some())
            .unwrap_or(false);
        if removed {
            debug!(peer_id = %peer_id, "Peer left mesh");
        }
        removed
    }

    /// Number of joined peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.inboxes.read().map(|inboxes| inboxes.len()).unwrap_or(0)
    }

    /// Total frames delivered across all peers.
    #[must_use]
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// One peer's view of an `InMemoryMesh`.
pub struct MeshTransport {
    local: PeerId,
    inboxes: Inboxes,
    frames_delivered: Arc<AtomicU64>,
}

#[async_trait]
impl PeerTransport for MeshTransport {
    fn local_peer_id(&self) -> &PeerId {
        &self.local
    }

    fn connected_peers(&self) -> Vec<PeerId> {
        let Ok(inboxes) = self.inboxes.read() else {
            return Vec::new();
        };
        let mut peers: Vec<PeerId> = inboxes
            .keys()
            .filter(|id| **id != self.local)
            .cloned()
            .collect();
        peers.sort();
        peers
    }

    async fn send(
        &self,
        key: &ActionKey,
        bytes: Vec<u8>,
        targets: Option<&[PeerId]>,
    ) -> Result<usize, TransportError> {
        let inboxes = self
            .inboxes
            .read()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        if !inboxes.contains_key(&self.local) {
            return Err(TransportError::Closed);
        }

        let recipients: Vec<&PeerId> = match targets {
            Some(targets) => targets.iter().filter(|id| **id != self.local).collect(),
            None => inboxes.keys().filter(|id| **id != self.local).collect(),
        };

        let mut delivered = 0;
        for recipient in recipients {
            let Some(inbox) = inboxes.get(recipient) else {
                debug!(action = %key, target = %recipient, "Target not connected, frame skipped");
                continue;
            };
            let frame = InboundFrame {
                key: key.clone(),
                sender: self.local.clone(),
                bytes: bytes.clone(),
            };
            if inbox.send(frame).is_ok() {
                delivered += 1;
            }
        }

        self.frames_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PeerId {
        PeerId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_others() {
        let mesh = InMemoryMesh::new();
        let (a, _a_rx) = mesh.join(id("a"));
        let (_b, mut b_rx) = mesh.join(id("b"));
        let (_c, mut c_rx) = mesh.join(id("c"));

        let key = ActionKey::from_wire("g.PING");
        let delivered = a.send(&key, vec![1], None).await.unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(b_rx.recv().await.unwrap().sender, id("a"));
        assert_eq!(c_rx.recv().await.unwrap().bytes, vec![1]);
        assert_eq!(mesh.frames_delivered(), 2);
    }

    #[tokio::test]
    async fn test_unknown_target_is_noop() {
        let mesh = InMemoryMesh::new();
        let (a, _a_rx) = mesh.join(id("a"));

        let key = ActionKey::from_wire("g.PING");
        let delivered = a.send(&key, vec![1], Some(&[id("ghost")])).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_per_sender_order_preserved() {
        let mesh = InMemoryMesh::new();
        let (a, _a_rx) = mesh.join(id("a"));
        let (_b, mut b_rx) = mesh.join(id("b"));

        let key = ActionKey::from_wire("g.SEQ");
        for i in 0..10u8 {
            a.send(&key, vec![i], Some(&[id("b")])).await.unwrap();
        }
        for i in 0..10u8 {
            assert_eq!(b_rx.recv().await.unwrap().bytes, vec![i]);
        }
    }

    #[tokio::test]
    async fn test_leave_closes_sender() {
        let mesh = InMemoryMesh::new();
        let (a, _a_rx) = mesh.join(id("a"));
        let (_b, _b_rx) = mesh.join(id("b"));

        assert_eq!(a.connected_peers(), vec![id("b")]);
        assert!(mesh.leave(&id("a")));
        assert!(!mesh.leave(&id("a")));

        let key = ActionKey::from_wire("g.PING");
        assert_eq!(a.send(&key, vec![], None).await, Err(TransportError::Closed));
        assert_eq!(mesh.peer_count(), 1);
    }
}
