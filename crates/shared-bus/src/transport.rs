//! # Peer Transport Port
//!
//! The boundary to whatever actually moves bytes between peers (WebRTC data
//! channels, QUIC streams, an in-process mesh). The channel only needs two
//! things from it: "send these bytes under this key to these peers", and a
//! stream of frames that arrived tagged with a key.

use crate::action::ActionKey;
use async_trait::async_trait;
use shared_types::PeerId;
use thiserror::Error;

/// A frame received from a remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Wire key the frame was tagged with.
    pub key: ActionKey,
    /// Connection the frame arrived on.
    pub sender: PeerId,
    /// Tagged payload bytes.
    pub bytes: Vec<u8>,
}

/// Errors from the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The local endpoint has left the mesh.
    #[error("Transport closed")]
    Closed,

    /// The transport refused the frame.
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Outbound side of a peer transport.
///
/// Inbound frames are handed to the channel as an
/// `mpsc::UnboundedReceiver<InboundFrame>` when it is spawned.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Identifier of the local connection endpoint.
    fn local_peer_id(&self) -> &PeerId;

    /// Peers with a live connection right now.
    fn connected_peers(&self) -> Vec<PeerId>;

    /// Send a frame.
    ///
    /// `targets = None` broadcasts to every connected peer. Targets that are
    /// not connected are skipped silently.
    ///
    /// # Returns
    ///
    /// The number of peers the frame was handed to.
    async fn send(
        &self,
        key: &ActionKey,
        bytes: Vec<u8>,
        targets: Option<&[PeerId]>,
    ) -> Result<usize, TransportError>;
}
